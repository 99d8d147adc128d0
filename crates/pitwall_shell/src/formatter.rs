//! Converts provider results and failures into tagged display output.
//!
//! Presentation switches on [`Severity`]. The legacy lexical markers (a leading `❌`, a leading
//! `Error:`, or the substrings `not found` / `No `) are still honored for older renderers: every
//! failure carries a marker and no success text ever contains one.

use pitwall_contract::{DisplayOutput, Severity, ShellError};
use tabled::{builder::Builder, settings::Style};

use crate::{command::DataQuery, provider::ProviderData};

/// Prefix carried by every failure text.
pub const ERROR_MARKER: &str = "❌";

const NBSP: char = '\u{a0}';

/// Whether `text` would be styled as an error by a marker-matching renderer.
pub fn has_error_marker(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
        || text.starts_with("Error:")
        || text.contains("not found")
        || text.contains("No ")
}

/// Rewrites accidental markers in success text so it cannot be mistaken for an error.
pub fn neutralize_markers(text: &str) -> String {
    let mut out = text
        .replace(ERROR_MARKER, "✖")
        .replace("not found", &format!("not{NBSP}found"))
        .replace("No ", &format!("No{NBSP}"));
    if out.starts_with("Error:") {
        out.replace_range(.."Error:".len(), "Error -");
    }
    out
}

/// Success output; markers are neutralized.
pub fn success(text: impl AsRef<str>) -> DisplayOutput {
    DisplayOutput {
        severity: Severity::Success,
        text: neutralize_markers(text.as_ref()),
    }
}

/// Failure output tagged with the error kind.
pub fn failure(error: &ShellError) -> DisplayOutput {
    DisplayOutput {
        severity: Severity::Error(error.kind),
        text: format!("{ERROR_MARKER} {}", error.message),
    }
}

/// Renders a provider result for `query`. Empty results are a negative outcome.
pub fn format_data(query: &DataQuery, data: ProviderData) -> DisplayOutput {
    let rendered = match data {
        ProviderData::Empty => None,
        ProviderData::Text { text } => Some(text).filter(|text| !text.trim().is_empty()),
        ProviderData::Record { title, fields } => {
            (!fields.is_empty()).then(|| with_title(title, render_record(&fields)))
        }
        ProviderData::Table {
            title,
            columns,
            rows,
        } => (!rows.is_empty()).then(|| with_title(title, render_table(&columns, &rows))),
    };
    match rendered {
        Some(text) => success(text),
        None => failure(&ShellError::provider(format!(
            "No data found for {}",
            query.describe()
        ))),
    }
}

fn with_title(title: Option<String>, body: String) -> String {
    match title {
        Some(title) if !title.trim().is_empty() => format!("{title}\n{body}"),
        _ => body,
    }
}

/// Aligned `label  value` lines.
pub fn render_record(fields: &[(String, String)]) -> String {
    let width = fields
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    fields
        .iter()
        .map(|(label, value)| format!("{label:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Column-aligned table with a header row.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    if !columns.is_empty() {
        builder.push_record(columns.iter().cloned());
    }
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use pitwall_contract::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn driver_query() -> DataQuery {
        DataQuery::Driver {
            name: "hamilton".to_string(),
        }
    }

    #[test]
    fn failures_always_carry_a_marker() {
        for error in [
            ShellError::parse("unknown command `/x`"),
            ShellError::validation("missing argument <round>"),
            ShellError::provider("upstream request failed: 502"),
            ShellError::persistence("storage write failed"),
        ] {
            let output = failure(&error);
            assert!(has_error_marker(&output.text), "{}", output.text);
            assert_eq!(output.severity, Severity::Error(error.kind));
        }
    }

    #[test]
    fn success_text_never_matches_a_marker() {
        for raw in [
            "❌ looks like an error",
            "Error: not really",
            "Car No 44, page not found",
            "No Limits",
        ] {
            let output = success(raw);
            assert!(!has_error_marker(&output.text), "{raw} -> {}", output.text);
            assert_eq!(output.severity, Severity::Success);
        }
    }

    #[test]
    fn clean_success_text_is_unchanged() {
        assert_eq!(success("Lewis Hamilton (GBR)").text, "Lewis Hamilton (GBR)");
    }

    #[test]
    fn empty_results_are_negative_outcomes() {
        let output = format_data(&driver_query(), ProviderData::Empty);
        assert_eq!(output.severity, Severity::Error(ErrorKind::Provider));
        assert_eq!(output.text, "❌ No data found for driver hamilton");

        let output = format_data(
            &driver_query(),
            ProviderData::Table {
                title: None,
                columns: vec!["pos".to_string()],
                rows: Vec::new(),
            },
        );
        assert!(output.severity.is_error());
    }

    #[test]
    fn records_align_labels() {
        let output = format_data(
            &driver_query(),
            ProviderData::Record {
                title: Some("Lewis Hamilton".to_string()),
                fields: vec![
                    ("team".to_string(), "Mercedes".to_string()),
                    ("number".to_string(), "44".to_string()),
                ],
            },
        );
        assert_eq!(output.severity, Severity::Success);
        assert_eq!(
            output.text,
            "Lewis Hamilton\nteam    Mercedes\nnumber  44"
        );
    }

    #[test]
    fn tables_include_headers_and_cells() {
        let output = format_data(
            &DataQuery::Standings,
            ProviderData::Table {
                title: None,
                columns: vec!["pos".to_string(), "driver".to_string()],
                rows: vec![
                    vec!["1".to_string(), "Verstappen".to_string()],
                    vec!["2".to_string(), "Perez".to_string()],
                ],
            },
        );
        assert_eq!(output.severity, Severity::Success);
        assert!(output.text.contains("driver"));
        assert!(output.text.contains("Verstappen"));
        assert_eq!(output.text.lines().count(), 4);
    }
}
