//! Interpreter configuration.

use std::time::Duration;

use pitwall_host::DEFAULT_THEME_ID;
use serde::{Deserialize, Serialize};

/// Actor label used when none is set or the stored one is unusable.
pub const DEFAULT_ACTOR: &str = "guest";
/// Store key holding the persisted actor label.
pub const ACTOR_KEY: &str = "pitwall.session.actor";
/// Store key holding the persisted theme id.
pub const THEME_KEY: &str = "pitwall.session.theme";
/// Default upper bound on one provider call.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 15_000;

/// How input lines without the command prefix are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlainTextPolicy {
    /// Record a parse error pointing at `/help`.
    #[default]
    Reject,
    /// Treat the text as a `/help <text>` topic search.
    Help,
}

/// Tunables for one interpreter instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Marker every command line starts with.
    pub command_prefix: char,
    /// Upper bound on one provider call in milliseconds; `None` waits indefinitely.
    pub provider_timeout_ms: Option<u64>,
    /// Plain-text handling.
    pub plain_text: PlainTextPolicy,
    /// Actor label used when none is set.
    pub default_actor: String,
    /// Theme id used when none is set; must exist in the catalog to take effect.
    pub default_theme: String,
    /// Store key for the actor label.
    pub actor_key: String,
    /// Store key for the theme id.
    pub theme_key: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            command_prefix: '/',
            provider_timeout_ms: Some(DEFAULT_PROVIDER_TIMEOUT_MS),
            plain_text: PlainTextPolicy::default(),
            default_actor: DEFAULT_ACTOR.to_string(),
            default_theme: DEFAULT_THEME_ID.to_string(),
            actor_key: ACTOR_KEY.to_string(),
            theme_key: THEME_KEY.to_string(),
        }
    }
}

impl InterpreterConfig {
    /// Parses a JSON config document; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the JSON decoding error message.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let mut config: Self = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if config.default_actor.trim().is_empty() {
            config.default_actor = DEFAULT_ACTOR.to_string();
        }
        Ok(config)
    }

    /// Provider timeout as a [`Duration`].
    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = InterpreterConfig::from_json(r#"{"provider_timeout_ms": 500}"#)
            .expect("parse config");
        assert_eq!(config.provider_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.command_prefix, '/');
        assert_eq!(config.plain_text, PlainTextPolicy::Reject);
        assert_eq!(config.actor_key, ACTOR_KEY);
    }

    #[test]
    fn null_timeout_disables_the_bound() {
        let config = InterpreterConfig::from_json(r#"{"provider_timeout_ms": null, "plain_text": "help"}"#)
            .expect("parse config");
        assert_eq!(config.provider_timeout(), None);
        assert_eq!(config.plain_text, PlainTextPolicy::Help);
    }

    #[test]
    fn blank_default_actor_is_restored() {
        let config =
            InterpreterConfig::from_json(r#"{"default_actor": "  "}"#).expect("parse config");
        assert_eq!(config.default_actor, DEFAULT_ACTOR);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(InterpreterConfig::from_json("{").is_err());
    }
}
