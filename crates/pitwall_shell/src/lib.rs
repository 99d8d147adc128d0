//! Slash-command interpreter for the pitwall terminal.
//!
//! Input lines go through a static [`CommandRegistry`], a synchronous parser, and a typed
//! [`Command`] model before the [`Interpreter`] dispatches them: session commands run inline and
//! data queries await one provider call. Results are tagged with a [`pitwall_contract::Severity`]
//! and appended to the [`HistoryStore`]. Session identity and theme persist through host ports and
//! stay in sync across tabs.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod autocomplete;
pub mod command;
pub mod config;
pub mod formatter;
pub mod history;
pub mod interpreter;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod session;
pub mod uptime;

pub use autocomplete::AutocompleteIndex;
pub use command::{Command, DataQuery, ProviderDomain};
pub use config::{InterpreterConfig, PlainTextPolicy, DEFAULT_ACTOR};
pub use history::HistoryStore;
pub use interpreter::{DispatchFuture, Interpreter, SubmitRejected};
pub use parser::{parse_line, tokenize, Invocation, ParsedLine};
pub use provider::{ProviderData, ProviderFailure, ProviderHandler, ProviderSet};
pub use registry::{CommandKind, CommandRegistry};
pub use session::{Session, SessionPorts, ThemeSelection};
pub use uptime::{format_timestamp, format_uptime, ticks, TICK_PERIOD};
