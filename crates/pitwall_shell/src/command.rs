//! Typed command model built from validated invocations.
//!
//! Every registry kind maps to exactly one variant with typed arguments, so dispatch is an
//! exhaustive `match` instead of a string lookup.

use pitwall_contract::ShellError;
use serde::{Deserialize, Serialize};

use crate::{parser::Invocation, registry::CommandKind};

/// Upstream API family that serves a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderDomain {
    /// Drivers, standings, calendar, circuits.
    Reference,
    /// Live timing.
    Live,
    /// Race, qualifying, lap, and pit-stop results.
    Results,
}

/// A data request handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum DataQuery {
    /// Driver profile.
    Driver {
        /// Driver name or code as typed.
        name: String,
    },
    /// Championship standings.
    Standings,
    /// Season calendar.
    Schedule,
    /// Circuit details.
    Track {
        /// Circuit name as typed.
        name: String,
    },
    /// Live timing snapshot.
    Live,
    /// Race results for a season or one round.
    Race {
        /// Season year.
        year: i32,
        /// Round within the season.
        round: Option<u32>,
    },
    /// Qualifying results.
    Qualifying {
        /// Season year.
        year: i32,
        /// Round within the season.
        round: u32,
    },
    /// Lap times.
    Laps {
        /// Season year.
        year: i32,
        /// Round within the season.
        round: u32,
        /// Restrict to one driver.
        driver: Option<String>,
    },
    /// Pit stops.
    PitStops {
        /// Season year.
        year: i32,
        /// Round within the season.
        round: u32,
    },
}

impl DataQuery {
    /// Registry name of the command that produced this query.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driver { .. } => "driver",
            Self::Standings => "standings",
            Self::Schedule => "schedule",
            Self::Track { .. } => "track",
            Self::Live => "live",
            Self::Race { .. } => "race",
            Self::Qualifying { .. } => "qualifying",
            Self::Laps { .. } => "laps",
            Self::PitStops { .. } => "pitstops",
        }
    }

    /// Positional arguments in their canonical text form.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Driver { name } | Self::Track { name } => vec![name.clone()],
            Self::Standings | Self::Schedule | Self::Live => Vec::new(),
            Self::Race { year, round } => {
                let mut args = vec![year.to_string()];
                args.extend(round.map(|round| round.to_string()));
                args
            }
            Self::Qualifying { year, round } | Self::PitStops { year, round } => {
                vec![year.to_string(), round.to_string()]
            }
            Self::Laps {
                year,
                round,
                driver,
            } => {
                let mut args = vec![year.to_string(), round.to_string()];
                args.extend(driver.clone());
                args
            }
        }
    }

    /// Provider family responsible for this query.
    pub fn domain(&self) -> ProviderDomain {
        match self {
            Self::Driver { .. } | Self::Standings | Self::Schedule | Self::Track { .. } => {
                ProviderDomain::Reference
            }
            Self::Live => ProviderDomain::Live,
            Self::Race { .. } | Self::Qualifying { .. } | Self::Laps { .. } | Self::PitStops { .. } => {
                ProviderDomain::Results
            }
        }
    }

    /// Human-readable request summary such as `race 2023 1`.
    pub fn describe(&self) -> String {
        let mut text = self.name().to_string();
        for arg in self.args() {
            text.push(' ');
            text.push_str(&arg);
        }
        text
    }
}

/// Everything the dispatcher can execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch data from a provider.
    Query(DataQuery),
    /// List commands, optionally filtered by topic.
    Help {
        /// Topic keyword or command name.
        topic: Option<String>,
    },
    /// Show or set the actor label.
    User {
        /// New label; `None` shows the current one.
        name: Option<String>,
    },
    /// Show or switch the theme.
    Theme {
        /// New theme id; `None` shows the current one.
        id: Option<String>,
    },
    /// List theme ids.
    Themes,
    /// Show session uptime.
    Uptime,
}

impl Command {
    /// Builds the typed command from a validated invocation.
    ///
    /// # Errors
    ///
    /// Returns a validation error when an integer argument is out of range.
    pub fn from_invocation(invocation: &Invocation) -> Result<Self, ShellError> {
        let args = Args(&invocation.args);
        let command = match invocation.kind {
            CommandKind::Driver => Self::Query(DataQuery::Driver {
                name: args.text(0)?,
            }),
            CommandKind::Standings => Self::Query(DataQuery::Standings),
            CommandKind::Schedule => Self::Query(DataQuery::Schedule),
            CommandKind::Track => Self::Query(DataQuery::Track {
                name: args.text(0)?,
            }),
            CommandKind::Live => Self::Query(DataQuery::Live),
            CommandKind::Race => Self::Query(DataQuery::Race {
                year: args.year(0)?,
                round: args.optional_round(1)?,
            }),
            CommandKind::Qualifying => Self::Query(DataQuery::Qualifying {
                year: args.year(0)?,
                round: args.round(1)?,
            }),
            CommandKind::Laps => Self::Query(DataQuery::Laps {
                year: args.year(0)?,
                round: args.round(1)?,
                driver: args.optional_text(2),
            }),
            CommandKind::PitStops => Self::Query(DataQuery::PitStops {
                year: args.year(0)?,
                round: args.round(1)?,
            }),
            CommandKind::Help => Self::Help {
                topic: args.optional_text(0),
            },
            CommandKind::User => Self::User {
                name: args.optional_text(0),
            },
            CommandKind::Theme => Self::Theme {
                id: args.optional_text(0),
            },
            CommandKind::Themes => Self::Themes,
            CommandKind::Uptime => Self::Uptime,
        };
        Ok(command)
    }
}

struct Args<'a>(&'a [String]);

impl Args<'_> {
    fn text(&self, index: usize) -> Result<String, ShellError> {
        self.0
            .get(index)
            .cloned()
            .ok_or_else(|| ShellError::validation(format!("missing argument #{}", index + 1)))
    }

    fn optional_text(&self, index: usize) -> Option<String> {
        self.0.get(index).cloned()
    }

    fn year(&self, index: usize) -> Result<i32, ShellError> {
        let raw = self.text(index)?;
        match raw.parse::<i32>() {
            Ok(year) if year > 0 => Ok(year),
            _ => Err(ShellError::validation(format!(
                "argument <year> is out of range: `{raw}`"
            ))),
        }
    }

    fn round(&self, index: usize) -> Result<u32, ShellError> {
        let raw = self.text(index)?;
        match raw.parse::<u32>() {
            Ok(round) if round > 0 => Ok(round),
            _ => Err(ShellError::validation(format!(
                "argument <round> must be 1 or greater: `{raw}`"
            ))),
        }
    }

    fn optional_round(&self, index: usize) -> Result<Option<u32>, ShellError> {
        if self.0.get(index).is_none() {
            return Ok(None);
        }
        self.round(index).map(Some)
    }
}
