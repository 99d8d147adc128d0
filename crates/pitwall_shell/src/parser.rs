//! Input line classification, tokenization, and argument validation.

use pitwall_contract::{ArgKind, CommandDescriptor, ShellError};

use crate::registry::{CommandKind, CommandRegistry};

/// One parsed, validated command ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Dispatch tag of the resolved command.
    pub kind: CommandKind,
    /// Resolved registry metadata.
    pub descriptor: CommandDescriptor,
    /// Positional arguments in slot order; never longer than the descriptor's slots.
    pub args: Vec<String>,
}

/// Classification of one submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Nothing but whitespace.
    Empty,
    /// Text without the command prefix, trimmed.
    Plain(String),
    /// A validated command.
    Command(Invocation),
}

/// Classifies and parses `line`.
///
/// # Errors
///
/// Returns a parse error for a missing or unknown command name, and a validation error for
/// malformed quoting or the wrong argument count or kind.
pub fn parse_line(
    registry: &CommandRegistry,
    line: &str,
    prefix: char,
) -> Result<ParsedLine, ShellError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ParsedLine::Empty);
    }
    let Some(body) = trimmed.strip_prefix(prefix) else {
        return Ok(ParsedLine::Plain(trimmed.to_string()));
    };
    parse_invocation(registry, body, prefix).map(ParsedLine::Command)
}

/// Parses the text after the prefix marker into an [`Invocation`].
///
/// The command name is the run of non-whitespace text directly after the prefix; it is never
/// quoted. Everything after it is tokenized as arguments.
///
/// # Errors
///
/// See [`parse_line`]. Malformed quoting in the arguments of a known command is a validation
/// error.
pub fn parse_invocation(
    registry: &CommandRegistry,
    body: &str,
    prefix: char,
) -> Result<Invocation, ShellError> {
    let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
    let (name, rest) = body.split_at(name_end);
    if name.is_empty() {
        return Err(ShellError::parse(format!(
            "missing command name after `{prefix}`; try {prefix}help"
        )));
    }
    let Some(registered) = registry.lookup(name) else {
        return Err(ShellError::parse(format!(
            "unknown command `{prefix}{name}`; try {prefix}help"
        )));
    };
    let args = tokenize(rest).map_err(|err| {
        ShellError::validation(format!(
            "{}; usage: {}",
            err.message,
            registered.descriptor.usage(prefix)
        ))
    })?;
    validate_args(&registered.descriptor, &args, prefix)?;
    Ok(Invocation {
        kind: registered.kind,
        descriptor: registered.descriptor.clone(),
        args,
    })
}

fn validate_args(
    descriptor: &CommandDescriptor,
    args: &[String],
    prefix: char,
) -> Result<(), ShellError> {
    if args.len() > descriptor.args.len() {
        return Err(ShellError::validation(format!(
            "too many arguments for {prefix}{} (quote multi-word values); usage: {}",
            descriptor.name,
            descriptor.usage(prefix)
        )));
    }
    for (index, spec) in descriptor.args.iter().enumerate() {
        match args.get(index) {
            None if spec.required => {
                return Err(ShellError::validation(format!(
                    "missing argument <{}>; usage: {}",
                    spec.name,
                    descriptor.usage(prefix)
                )));
            }
            None => {}
            Some(value) if spec.kind == ArgKind::Integer && value.parse::<i64>().is_err() => {
                return Err(ShellError::validation(format!(
                    "argument <{}> must be an integer, got `{value}`",
                    spec.name
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Splits `line` on whitespace. A quote at the start of a token groups words up to the matching
/// quote; inside a word it is literal. Backslash escapes one character.
///
/// # Errors
///
/// Returns a parse error for a dangling escape or an unterminated quote.
pub fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();
    let mut quote = None::<char>;

    while let Some(ch) = chars.next() {
        match quote {
            Some(active) if ch == active => quote = None,
            Some(_) if ch == '\\' => {
                let Some(next) = chars.next() else {
                    return Err(ShellError::parse("dangling escape sequence"));
                };
                current.push(next);
            }
            Some(_) => current.push(ch),
            None if !in_token && (ch == '"' || ch == '\'') => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None if ch == '\\' => {
                let Some(next) = chars.next() else {
                    return Err(ShellError::parse("dangling escape sequence"));
                };
                current.push(next);
                in_token = true;
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(ShellError::parse("unterminated quoted string"));
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use pitwall_contract::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(line: &str) -> Result<ParsedLine, ShellError> {
        parse_line(&CommandRegistry::builtin(), line, '/')
    }

    fn invocation(line: &str) -> Invocation {
        match parse(line).expect("parse") {
            ParsedLine::Command(invocation) => invocation,
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn driver_takes_one_text_argument() {
        let parsed = invocation("  /driver hamilton  ");
        assert_eq!(parsed.kind, CommandKind::Driver);
        assert_eq!(parsed.args, vec!["hamilton"]);
    }

    #[test]
    fn command_names_are_case_insensitive() {
        assert_eq!(invocation("/RACE 2023 1").kind, CommandKind::Race);
    }

    #[test]
    fn optional_round_may_be_omitted() {
        let parsed = invocation("/race 2023");
        assert_eq!(parsed.args, vec!["2023"]);
    }

    #[test]
    fn missing_required_round_is_a_validation_error() {
        let error = parse("/qualifying 2023").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.starts_with("missing argument <round>"));
    }

    #[test]
    fn non_integer_year_is_a_validation_error() {
        let error = parse("/race twenty").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.contains("<year> must be an integer"));
    }

    #[test]
    fn surplus_arguments_are_rejected() {
        let error = parse("/driver max verstappen").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn quoted_arguments_group_words() {
        let parsed = invocation("/track \"monte carlo\"");
        assert_eq!(parsed.args, vec!["monte carlo"]);
        let parsed = invocation("/track monte\\ carlo");
        assert_eq!(parsed.args, vec!["monte carlo"]);
    }

    #[test]
    fn empty_quotes_form_an_empty_argument() {
        let parsed = invocation("/user \"\"");
        assert_eq!(parsed.args, vec![String::new()]);
    }

    #[test]
    fn unknown_command_is_a_parse_error() {
        let error = parse("/unknown").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
        assert!(error.message.contains("unknown command `/unknown`"));
    }

    #[test]
    fn partial_names_are_not_corrected() {
        let error = parse("/driv hamilton").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
    }

    #[test]
    fn bare_prefix_is_a_parse_error() {
        let error = parse("/").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
    }

    #[test]
    fn plain_text_and_blank_lines_are_classified() {
        assert_eq!(parse("   ").expect("parse"), ParsedLine::Empty);
        assert_eq!(
            parse("  who won monaco ").expect("parse"),
            ParsedLine::Plain("who won monaco".to_string())
        );
    }

    #[test]
    fn apostrophes_inside_words_are_literal() {
        let parsed = invocation("/driver o'ward");
        assert_eq!(parsed.kind, CommandKind::Driver);
        assert_eq!(parsed.args, vec!["o'ward"]);
        assert_eq!(tokenize("it's \"monte carlo\"").expect("tokenize"), vec!["it's", "monte carlo"]);
    }

    #[test]
    fn unterminated_quote_in_arguments_is_a_validation_error() {
        let error = parse("/track \"monte carlo").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Validation);
        assert!(error.message.starts_with("unterminated quoted string; usage: /track"));
    }

    #[test]
    fn command_name_must_follow_the_prefix_directly() {
        let error = parse("/ driver hamilton").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
        assert!(error.message.starts_with("missing command name after `/`"));

        let error = parse("/\"driver\" hamilton").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
        assert!(error.message.contains("unknown command `/\"driver\"`"));
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let error = tokenize("track \"monte").expect_err("should fail");
        assert_eq!(error.kind, ErrorKind::Parse);
        assert!(error.message.contains("unterminated"));
    }
}
