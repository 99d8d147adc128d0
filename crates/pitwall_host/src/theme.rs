//! Theme catalog referenced by id from the session.
//!
//! The interpreter never reads or mutates palettes; it only asks whether an id exists and what
//! the fallback id is. Palettes are carried for the presentation layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Theme id used when nothing valid is selected.
pub const DEFAULT_THEME_ID: &str = "classic";

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Stable id, also used as the CSS class suffix.
    pub id: String,
    /// Semantic slot to color value.
    pub palette: BTreeMap<String, String>,
}

impl Theme {
    fn new(id: &str, slots: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            palette: slots
                .iter()
                .map(|(slot, color)| (slot.to_string(), color.to_string()))
                .collect(),
        }
    }
}

/// Fixed set of themes plus the fallback id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
    default_id: String,
}

impl ThemeCatalog {
    /// Builds a catalog. Falls back to the first theme when `default_id` is not present.
    pub fn new(themes: Vec<Theme>, default_id: impl Into<String>) -> Self {
        let default_id = default_id.into();
        let default_id = if themes.iter().any(|theme| theme.id == default_id) {
            default_id
        } else {
            themes
                .first()
                .map(|theme| theme.id.clone())
                .unwrap_or(default_id)
        };
        Self { themes, default_id }
    }

    /// Built-in terminal palettes.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                Theme::new(
                    "classic",
                    &[
                        ("background", "#0b0f0b"),
                        ("foreground", "#33ff66"),
                        ("accent", "#b8ffcc"),
                        ("error", "#ff5555"),
                    ],
                ),
                Theme::new(
                    "amber",
                    &[
                        ("background", "#120c02"),
                        ("foreground", "#ffb000"),
                        ("accent", "#ffd37a"),
                        ("error", "#ff4d4d"),
                    ],
                ),
                Theme::new(
                    "redline",
                    &[
                        ("background", "#140405"),
                        ("foreground", "#f2f2f2"),
                        ("accent", "#dc0000"),
                        ("error", "#ffcc00"),
                    ],
                ),
                Theme::new(
                    "silver-arrow",
                    &[
                        ("background", "#101314"),
                        ("foreground", "#c0c6c8"),
                        ("accent", "#00d2be"),
                        ("error", "#ff6b6b"),
                    ],
                ),
                Theme::new(
                    "papaya",
                    &[
                        ("background", "#1a1a1a"),
                        ("foreground", "#ff8700"),
                        ("accent", "#47c7fc"),
                        ("error", "#ff3b3b"),
                    ],
                ),
            ],
            DEFAULT_THEME_ID,
        )
    }

    /// Fallback id.
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Whether `id` names a catalog theme.
    pub fn contains(&self, id: &str) -> bool {
        self.themes.iter().any(|theme| theme.id == id)
    }

    /// Looks up a theme by id.
    pub fn get(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|theme| theme.id == id)
    }

    /// Canonical id of the theme named by `id`, ignoring case and surrounding whitespace.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        let wanted = id.trim();
        self.themes
            .iter()
            .find(|theme| theme.id.eq_ignore_ascii_case(wanted))
            .map(|theme| theme.id.as_str())
    }

    /// Catalog ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|theme| theme.id.as_str())
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolve_accepts_known_ids_case_insensitively() {
        let catalog = ThemeCatalog::builtin();
        assert_eq!(catalog.resolve("Amber"), Some("amber"));
        assert_eq!(catalog.resolve(" redline "), Some("redline"));
    }

    #[test]
    fn resolve_rejects_unknown_ids() {
        let catalog = ThemeCatalog::builtin();
        assert_eq!(catalog.resolve("nonexistent-id"), None);
        assert_eq!(catalog.resolve(""), None);
        assert!(catalog.contains(DEFAULT_THEME_ID));
    }

    #[test]
    fn missing_default_falls_back_to_first_theme() {
        let catalog = ThemeCatalog::new(vec![Theme::new("solo", &[])], "ghost");
        assert_eq!(catalog.default_id(), "solo");
        assert!(catalog.contains("solo"));
    }

    #[test]
    fn every_builtin_theme_fills_the_same_slots() {
        let catalog = ThemeCatalog::builtin();
        for id in catalog.ids() {
            let theme = catalog.get(id).expect("theme");
            assert_eq!(
                theme.palette.keys().map(String::as_str).collect::<Vec<_>>(),
                vec!["accent", "background", "error", "foreground"]
            );
        }
    }
}
