//! Dispatcher: one submission at a time from input line to history entry.
//!
//! `submit` moves the session from idle to processing, parses synchronously, and either records a
//! local result immediately or returns a future that awaits exactly one provider call (bounded by
//! the configured timeout). Every settled submission appends exactly one history entry before the
//! session returns to idle. A submission made while another is in flight is refused.

use std::{cell::Cell, rc::Rc, time::Duration};

use futures::{
    future::{self, Either, LocalBoxFuture},
    FutureExt,
};
use leptos::logging;
use pitwall_contract::{
    CompletionItem, DispatchOutcome, DispatchReport, DisplayOutput, ExecutionId, HistoryEntry,
    Severity, ShellError,
};
use pitwall_host::{Clock, Sleeper, ThemeCatalog};
use thiserror::Error;

use crate::{
    autocomplete::AutocompleteIndex,
    command::{Command, DataQuery},
    config::{InterpreterConfig, PlainTextPolicy},
    formatter::{failure, format_data, render_table, success},
    history::HistoryStore,
    parser::{parse_line, ParsedLine},
    provider::ProviderSet,
    registry::CommandRegistry,
    session::{Session, SessionPorts, ThemeSelection},
    uptime::{format_timestamp, format_uptime},
};

/// Why a submission was refused without touching history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    /// Another invocation is still in flight.
    #[error("an invocation is already in progress")]
    Busy,
    /// The line was blank.
    #[error("nothing to run")]
    Empty,
}

/// Pending or settled dispatch.
pub type DispatchFuture = LocalBoxFuture<'static, DispatchReport>;

struct InterpreterInner {
    config: InterpreterConfig,
    registry: CommandRegistry,
    autocomplete: AutocompleteIndex,
    providers: ProviderSet,
    session: Session,
    history: HistoryStore,
    clock: Rc<dyn Clock>,
    sleeper: Rc<dyn Sleeper>,
    next_execution_id: Cell<u64>,
}

/// Shared handle to one tab's interpreter.
#[derive(Clone)]
pub struct Interpreter {
    inner: Rc<InterpreterInner>,
}

/// Clears the processing flag when a dispatch settles or its future is dropped.
struct ProcessingGuard {
    session: Session,
}

impl ProcessingGuard {
    fn engage(session: &Session) -> Self {
        session.set_processing(true);
        Self {
            session: session.clone(),
        }
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.session.set_processing(false);
    }
}

impl Interpreter {
    /// Builds an interpreter and starts its session over `ports`.
    pub fn new(
        config: InterpreterConfig,
        catalog: ThemeCatalog,
        providers: ProviderSet,
        ports: SessionPorts,
        sleeper: Rc<dyn Sleeper>,
    ) -> Self {
        let registry = CommandRegistry::builtin();
        let autocomplete = AutocompleteIndex::new(&registry, config.command_prefix);
        let clock = ports.clock.clone();
        let session = Session::start(&config, catalog, ports);
        Self {
            inner: Rc::new(InterpreterInner {
                config,
                registry,
                autocomplete,
                providers,
                session,
                history: HistoryStore::default(),
                clock,
                sleeper,
                next_execution_id: Cell::new(1),
            }),
        }
    }

    /// Submits one input line.
    ///
    /// Parse and validation failures and session commands settle before this returns; the
    /// returned future is then already complete. Provider queries settle when the provider
    /// answers or the timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitRejected::Busy`] while another submission is in flight and
    /// [`SubmitRejected::Empty`] for a blank line. Neither changes history.
    pub fn submit(&self, line: &str) -> Result<DispatchFuture, SubmitRejected> {
        let inner = &self.inner;
        if inner.session.is_processing() {
            logging::warn!("submission ignored while another invocation is in flight");
            return Err(SubmitRejected::Busy);
        }
        let command = match parse_line(&inner.registry, line, inner.config.command_prefix) {
            Ok(ParsedLine::Empty) => return Err(SubmitRejected::Empty),
            Ok(ParsedLine::Plain(text)) => self.plain_text(&text),
            Ok(ParsedLine::Command(invocation)) => Command::from_invocation(&invocation),
            Err(err) => Err(err),
        };

        let guard = ProcessingGuard::engage(&inner.session);
        let execution_id = self.next_execution_id();
        let command_text = line.trim().to_string();

        let query = match command {
            Err(err) => {
                let report = self.record(execution_id, command_text, failure(&err));
                drop(guard);
                return Ok(future::ready(report).boxed_local());
            }
            Ok(Command::Query(query)) => query,
            Ok(local) => {
                let output = self.run_local(local);
                let report = self.record(execution_id, command_text, output);
                drop(guard);
                return Ok(future::ready(report).boxed_local());
            }
        };

        let fetch = self.fetch(query);
        let interpreter = self.clone();
        Ok(async move {
            let output = match fetch.await {
                Ok(output) => output,
                Err(err) => failure(&err),
            };
            let report = interpreter.record(execution_id, command_text, output);
            drop(guard);
            report
        }
        .boxed_local())
    }

    /// Completion candidates for a partial command token.
    pub fn suggest(&self, partial: &str) -> Vec<CompletionItem> {
        self.inner.autocomplete.suggest(partial)
    }

    /// Scrollback log.
    pub fn history(&self) -> &HistoryStore {
        &self.inner.history
    }

    /// Session state owned by this interpreter.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Command table.
    pub fn registry(&self) -> &CommandRegistry {
        &self.inner.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &InterpreterConfig {
        &self.inner.config
    }

    /// Wall clock used for timestamps.
    pub fn clock(&self) -> Rc<dyn Clock> {
        self.inner.clock.clone()
    }

    /// Timer used for provider timeouts; also drives display ticks.
    pub fn sleeper(&self) -> Rc<dyn Sleeper> {
        self.inner.sleeper.clone()
    }

    fn next_execution_id(&self) -> ExecutionId {
        let id = self.inner.next_execution_id.get();
        self.inner.next_execution_id.set(id.wrapping_add(1));
        ExecutionId(id)
    }

    fn plain_text(&self, text: &str) -> Result<Command, ShellError> {
        let prefix = self.inner.config.command_prefix;
        match self.inner.config.plain_text {
            PlainTextPolicy::Reject => Err(ShellError::parse(format!(
                "`{text}` is not a command; commands start with `{prefix}`, try {prefix}help"
            ))),
            PlainTextPolicy::Help => Ok(Command::Help {
                topic: Some(text.to_string()),
            }),
        }
    }

    /// Starts the provider call now and races it against the configured timeout.
    fn fetch(&self, query: DataQuery) -> LocalBoxFuture<'static, Result<DisplayOutput, ShellError>> {
        let handler = self.inner.providers.handler(query.domain()).clone();
        let call = handler(query.clone());
        let Some(limit) = self.inner.config.provider_timeout() else {
            return async move {
                call.await
                    .map(|data| format_data(&query, data))
                    .map_err(ShellError::from)
            }
            .boxed_local();
        };
        let timer = self.inner.sleeper.sleep(limit);
        async move {
            match future::select(call, timer).await {
                Either::Left((result, _)) => result
                    .map(|data| format_data(&query, data))
                    .map_err(ShellError::from),
                Either::Right(((), _)) => {
                    logging::warn!("provider call `{}` timed out", query.describe());
                    Err(ShellError::provider(format!(
                        "request timed out after {}",
                        describe_duration(limit)
                    )))
                }
            }
        }
        .boxed_local()
    }

    fn run_local(&self, command: Command) -> DisplayOutput {
        let session = &self.inner.session;
        let prefix = self.inner.config.command_prefix;
        match command {
            Command::Query(query) => failure(&ShellError::validation(format!(
                "`{}` needs a provider",
                query.describe()
            ))),
            Command::Help { topic: None } => {
                let rows = self
                    .inner
                    .registry
                    .all()
                    .map(|descriptor| {
                        vec![
                            descriptor.usage(prefix),
                            descriptor.description.clone(),
                            descriptor.source.label().to_string(),
                        ]
                    })
                    .collect::<Vec<_>>();
                let columns = ["command", "description", "source"].map(String::from);
                success(format!(
                    "Available commands\n{}",
                    render_table(&columns, &rows)
                ))
            }
            Command::Help { topic: Some(topic) } => {
                let matches = self.inner.autocomplete.topic(&topic);
                if matches.is_empty() {
                    let topics = self.inner.autocomplete.topics().collect::<Vec<_>>();
                    return failure(&ShellError::validation(format!(
                        "no commands match `{topic}`; topics: {}",
                        topics.join(", ")
                    )));
                }
                let rows = matches
                    .into_iter()
                    .map(|item| vec![item.label, item.detail.unwrap_or_default()])
                    .collect::<Vec<_>>();
                let columns = ["command", "description"].map(String::from);
                success(format!(
                    "Commands for `{topic}`\n{}",
                    render_table(&columns, &rows)
                ))
            }
            Command::User { name: None } => success(format!("Current user: {}", session.actor())),
            Command::User { name: Some(name) } => {
                success(format!("User set to {}", session.set_actor(&name)))
            }
            Command::Theme { id: None } => success(format!("Current theme: {}", session.theme())),
            Command::Theme { id: Some(id) } => match session.set_theme(&id) {
                ThemeSelection::Applied(applied) => success(format!("Theme set to {applied}")),
                ThemeSelection::FellBack { requested, applied } => {
                    failure(&ShellError::validation(format!(
                        "unknown theme `{requested}`, using {applied}; see {prefix}themes"
                    )))
                }
            },
            Command::Themes => {
                let current = session.theme();
                let catalog = session.catalog();
                let lines = catalog
                    .ids()
                    .map(|id| {
                        let marker = if id == current { '*' } else { ' ' };
                        let accent = catalog
                            .get(id)
                            .and_then(|theme| theme.palette.get("accent"))
                            .map(String::as_str)
                            .unwrap_or("-");
                        format!("{marker} {id:<10} accent {accent}")
                    })
                    .collect::<Vec<_>>();
                success(format!("Available themes\n{}", lines.join("\n")))
            }
            Command::Uptime => success(format!(
                "Session uptime: {}",
                format_uptime(session.uptime())
            )),
        }
    }

    fn record(
        &self,
        execution_id: ExecutionId,
        command: String,
        output: DisplayOutput,
    ) -> DispatchReport {
        let entry = HistoryEntry {
            command,
            output: output.text,
            severity: output.severity,
            actor: self.inner.session.actor(),
            timestamp: format_timestamp(self.inner.clock.now_ms()),
        };
        self.inner.history.append(entry.clone());
        let outcome = match output.severity {
            Severity::Success => DispatchOutcome::Completed,
            Severity::Error(error) => DispatchOutcome::Failed { error },
        };
        DispatchReport {
            execution_id,
            outcome,
            entry,
        }
    }
}

fn describe_duration(limit: Duration) -> String {
    if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}
