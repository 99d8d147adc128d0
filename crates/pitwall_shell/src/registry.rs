//! Static command table.
//!
//! The table is built once per process and never mutated; adding a command means adding a
//! [`CommandKind`] variant and a row in [`CommandRegistry::builtin`].

use pitwall_contract::{ArgKind, ArgSpec, CommandDescriptor, SourceLabel};

/// Closed set of command kinds known to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `/driver <name>`
    Driver,
    /// `/standings`
    Standings,
    /// `/schedule`
    Schedule,
    /// `/track <name>`
    Track,
    /// `/live`
    Live,
    /// `/race <year> [round]`
    Race,
    /// `/qualifying <year> <round>`
    Qualifying,
    /// `/laps <year> <round> [driver]`
    Laps,
    /// `/pitstops <year> <round>`
    PitStops,
    /// `/help [topic]`
    Help,
    /// `/user [name]`
    User,
    /// `/theme [id]`
    Theme,
    /// `/themes`
    Themes,
    /// `/uptime`
    Uptime,
}

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    /// Dispatch tag.
    pub kind: CommandKind,
    /// Public metadata.
    pub descriptor: CommandDescriptor,
}

/// Read-only command table in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
}

fn row(
    kind: CommandKind,
    name: &str,
    args: Vec<ArgSpec>,
    description: &str,
    source: SourceLabel,
) -> RegisteredCommand {
    RegisteredCommand {
        kind,
        descriptor: CommandDescriptor {
            name: name.to_string(),
            args,
            description: description.to_string(),
            source,
        },
    }
}

fn year_round() -> Vec<ArgSpec> {
    vec![
        ArgSpec::required("year", ArgKind::Integer),
        ArgSpec::required("round", ArgKind::Integer),
    ]
}

impl CommandRegistry {
    /// The built-in command table.
    pub fn builtin() -> Self {
        use CommandKind as K;
        use SourceLabel as S;

        Self {
            commands: vec![
                row(
                    K::Driver,
                    "driver",
                    vec![ArgSpec::required("name", ArgKind::Text)],
                    "Driver profile, team and season statistics",
                    S::Reference,
                ),
                row(
                    K::Standings,
                    "standings",
                    Vec::new(),
                    "Current drivers' championship standings",
                    S::Reference,
                ),
                row(
                    K::Schedule,
                    "schedule",
                    Vec::new(),
                    "Race calendar for the current season",
                    S::Reference,
                ),
                row(
                    K::Track,
                    "track",
                    vec![ArgSpec::required("name", ArgKind::Text)],
                    "Circuit details and lap record",
                    S::Reference,
                ),
                row(
                    K::Live,
                    "live",
                    Vec::new(),
                    "Live timing for the session in progress",
                    S::LiveTiming,
                ),
                row(
                    K::Race,
                    "race",
                    vec![
                        ArgSpec::required("year", ArgKind::Integer),
                        ArgSpec::optional("round", ArgKind::Integer),
                    ],
                    "Race results for a season, or for one round",
                    S::Results,
                ),
                row(
                    K::Qualifying,
                    "qualifying",
                    year_round(),
                    "Qualifying results for one round",
                    S::Results,
                ),
                row(
                    K::Laps,
                    "laps",
                    {
                        let mut args = year_round();
                        args.push(ArgSpec::optional("driver", ArgKind::Text));
                        args
                    },
                    "Lap times for one round, optionally for one driver",
                    S::Results,
                ),
                row(
                    K::PitStops,
                    "pitstops",
                    year_round(),
                    "Pit stop timeline for one round",
                    S::Results,
                ),
                row(
                    K::Help,
                    "help",
                    vec![ArgSpec::optional("topic", ArgKind::Text)],
                    "List commands, or the commands matching a topic",
                    S::Session,
                ),
                row(
                    K::User,
                    "user",
                    vec![ArgSpec::optional("name", ArgKind::Text)],
                    "Show or set your display name",
                    S::Session,
                ),
                row(
                    K::Theme,
                    "theme",
                    vec![ArgSpec::optional("id", ArgKind::Text)],
                    "Show or switch the color theme",
                    S::Session,
                ),
                row(
                    K::Themes,
                    "themes",
                    Vec::new(),
                    "List available themes",
                    S::Session,
                ),
                row(
                    K::Uptime,
                    "uptime",
                    Vec::new(),
                    "Show how long this session has been open",
                    S::Session,
                ),
            ],
        }
    }

    /// Case-insensitive exact-name lookup.
    pub fn lookup(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands
            .iter()
            .find(|command| command.descriptor.name.eq_ignore_ascii_case(name))
    }

    /// Registry rows in declaration order.
    pub fn entries(&self) -> &[RegisteredCommand] {
        &self.commands
    }

    /// Descriptors in declaration order.
    pub fn all(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter().map(|command| &command.descriptor)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
