//! Prefix completion over registry names and topic keywords.

use pitwall_contract::{CommandDescriptor, CompletionItem};

use crate::registry::CommandRegistry;

/// Subject keywords mapped to the commands they cover.
const TOPICS: &[(&str, &[&str])] = &[
    ("drivers", &["driver", "standings", "laps"]),
    ("calendar", &["schedule", "race"]),
    ("circuits", &["track"]),
    ("timing", &["live", "laps"]),
    ("results", &["race", "qualifying", "laps", "pitstops"]),
    ("session", &["user", "theme", "themes", "uptime", "help"]),
];

/// Read-only completion index built from a registry snapshot.
#[derive(Debug, Clone)]
pub struct AutocompleteIndex {
    prefix: char,
    commands: Vec<CommandDescriptor>,
}

impl AutocompleteIndex {
    /// Builds the index over `registry` in declaration order.
    pub fn new(registry: &CommandRegistry, prefix: char) -> Self {
        Self {
            prefix,
            commands: registry.all().cloned().collect(),
        }
    }

    /// Candidates whose name, or one of whose topic keywords, starts with `partial`.
    ///
    /// A leading prefix marker on `partial` is ignored. An empty partial lists every command.
    pub fn suggest(&self, partial: &str) -> Vec<CompletionItem> {
        let needle = partial.trim();
        let needle = needle.strip_prefix(self.prefix).unwrap_or(needle).to_ascii_lowercase();
        self.matching(|name| {
            name.starts_with(&needle)
                || topics_for(name).any(|topic| topic.starts_with(&needle))
        })
    }

    /// Commands whose name or topic keyword equals `topic` exactly (case-insensitive).
    pub fn topic(&self, topic: &str) -> Vec<CompletionItem> {
        let wanted = topic.trim();
        let wanted = wanted.strip_prefix(self.prefix).unwrap_or(wanted).to_ascii_lowercase();
        self.matching(|name| name == wanted || topics_for(name).any(|topic| topic == wanted))
    }

    /// Known topic keywords.
    pub fn topics(&self) -> impl Iterator<Item = &'static str> {
        TOPICS.iter().map(|(topic, _)| *topic)
    }

    fn matching(&self, accept: impl Fn(&str) -> bool) -> Vec<CompletionItem> {
        self.commands
            .iter()
            .filter(|descriptor| accept(&descriptor.name.to_ascii_lowercase()))
            .map(|descriptor| CompletionItem {
                value: format!("{}{}", self.prefix, descriptor.name),
                label: descriptor.usage(self.prefix),
                detail: Some(descriptor.description.clone()),
            })
            .collect()
    }
}

fn topics_for(name: &str) -> impl Iterator<Item = &'static str> + '_ {
    TOPICS
        .iter()
        .filter(move |(_, commands)| commands.iter().any(|command| *command == name))
        .map(|(topic, _)| *topic)
}
