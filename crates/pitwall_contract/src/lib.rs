//! Shared command and session contracts used by the interpreter, host adapters, and terminal UI.
//!
//! This crate is intentionally runtime-agnostic. It defines serializable command metadata,
//! scrollback entries, error classification, completion payloads, and session snapshots without
//! depending on Leptos, browser APIs, or interpreter internals.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Execution identifier for one submitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub u64);

/// Value kind accepted by a positional argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgKind {
    /// Free text, any token is accepted.
    Text,
    /// A base-10 integer such as a season year or round number.
    Integer,
}

/// Positional argument slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Human-readable argument label.
    pub name: String,
    /// Whether this argument is required.
    pub required: bool,
    /// Accepted value kind.
    pub kind: ArgKind,
}

impl ArgSpec {
    /// Required argument.
    pub fn required(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
        }
    }

    /// Optional argument.
    pub fn optional(name: impl Into<String>, kind: ArgKind) -> Self {
        Self {
            name: name.into(),
            required: false,
            kind,
        }
    }

    /// Usage fragment, `<name>` when required and `[name]` when optional.
    pub fn usage(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

/// Where a command's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLabel {
    /// General race, driver, and schedule reference data.
    Reference,
    /// Live timing data.
    LiveTiming,
    /// Detailed race, qualifying, lap, and pit-stop results.
    Results,
    /// Handled by the interpreter itself.
    Session,
}

impl SourceLabel {
    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::LiveTiming => "live timing",
            Self::Results => "results",
            Self::Session => "session",
        }
    }
}

/// Full command registration metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Canonical lowercase command name without the prefix marker.
    pub name: String,
    /// Positional argument metadata, in slot order.
    pub args: Vec<ArgSpec>,
    /// One-line description shown in help output.
    pub description: String,
    /// Data source responsible for the command.
    pub source: SourceLabel,
}

impl CommandDescriptor {
    /// Usage string such as `/race <year> [round]`.
    pub fn usage(&self, prefix: char) -> String {
        let mut usage = format!("{prefix}{}", self.name);
        for arg in &self.args {
            usage.push(' ');
            usage.push_str(&arg.usage());
        }
        usage
    }
}

/// Structured error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Unrecognized command token or plain text that is not accepted.
    Parse,
    /// Wrong argument count or type for a recognized command.
    Validation,
    /// The data provider failed, timed out, or had nothing to report.
    Provider,
    /// The persistent key-value store could not be read or written.
    Persistence,
}

/// Error emitted by parsing, validation, providers, or persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ShellError {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl ShellError {
    /// Creates a new shell error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Parse failure.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Provider failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Provider, message)
    }

    /// Persistence failure.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }
}

/// Display classification of a formatted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Rendered provider or session output.
    Success,
    /// A negative outcome of the given kind.
    Error(ErrorKind),
}

impl Severity {
    /// Whether the presentation layer should use error styling.
    pub fn is_error(self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Formatted, display-safe output tagged with its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOutput {
    /// Severity tag.
    pub severity: Severity,
    /// Rendered text.
    pub text: String,
}

/// One scrollback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Raw submitted text.
    pub command: String,
    /// Formatted output.
    pub output: String,
    /// Severity tag of `output`.
    pub severity: Severity,
    /// Actor label at dispatch completion.
    pub actor: String,
    /// Wall-clock time of dispatch completion, `HH:MM:SS`.
    pub timestamp: String,
}

/// Terminal outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DispatchOutcome {
    /// The invocation produced output.
    Completed,
    /// The invocation failed with the given error kind.
    Failed {
        /// Error category.
        error: ErrorKind,
    },
}

/// Summary returned once a dispatch settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Execution identifier.
    pub execution_id: ExecutionId,
    /// Terminal outcome.
    pub outcome: DispatchOutcome,
    /// The entry appended to history.
    pub entry: HistoryEntry,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    /// Text inserted into the input line.
    pub value: String,
    /// Human-readable label.
    pub label: String,
    /// Optional short description.
    pub detail: Option<String>,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Display identity, never empty.
    pub actor: String,
    /// Active theme id, always a catalog id.
    pub theme: String,
    /// Session start, unix milliseconds.
    pub session_start_ms: u64,
    /// Whether a dispatch is in flight.
    pub processing: bool,
}

/// Session field change broadcast to same-tab listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "kebab-case")]
pub enum SessionChange {
    /// The actor label changed.
    Actor(String),
    /// The active theme id changed.
    Theme(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn race_descriptor() -> CommandDescriptor {
        CommandDescriptor {
            name: "race".to_string(),
            args: vec![
                ArgSpec::required("year", ArgKind::Integer),
                ArgSpec::optional("round", ArgKind::Integer),
            ],
            description: "Race results".to_string(),
            source: SourceLabel::Results,
        }
    }

    #[test]
    fn usage_marks_optional_slots() {
        assert_eq!(race_descriptor().usage('/'), "/race <year> [round]");
    }

    #[test]
    fn shell_error_displays_message() {
        let error = ShellError::validation("missing argument <round>");
        assert_eq!(error.to_string(), "missing argument <round>");
        assert_eq!(error.kind, ErrorKind::Validation);
    }

    #[test]
    fn session_change_serializes_with_field_tag() {
        let raw = serde_json::to_string(&SessionChange::Theme("redline".to_string()))
            .expect("serialize");
        assert_eq!(raw, r#"{"field":"theme","value":"redline"}"#);
        let back: SessionChange = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, SessionChange::Theme("redline".to_string()));
    }

    #[test]
    fn error_severity_is_flagged() {
        assert!(Severity::Error(ErrorKind::Provider).is_error());
        assert!(!Severity::Success.is_error());
    }
}
