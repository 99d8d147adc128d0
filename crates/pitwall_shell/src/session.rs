//! Per-tab session state with persisted identity/theme and cross-tab synchronization.
//!
//! The session owns its ports explicitly: a key-value store for `actor`/`theme`, a same-tab
//! change channel, and the cross-tab storage-change source. Writes replace whole values; the last
//! write to the shared store wins.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use leptos::logging;
use pitwall_contract::{SessionChange, SessionSnapshot, ShellError};
use pitwall_host::{
    load_typed_with, save_typed_with, ChangeChannel, ChangeListener, Clock, KeyValueStore,
    LocalChangeChannel, MemoryKeyValueStore, NoopStorageEvents, StorageChange, StorageEvents,
    Subscription, SystemClock, ThemeCatalog,
};

use crate::config::{InterpreterConfig, DEFAULT_ACTOR};

/// Host collaborators a session depends on.
#[derive(Clone)]
pub struct SessionPorts {
    /// Persistent store for `actor` and `theme`.
    pub store: Rc<dyn KeyValueStore>,
    /// Changes written by other tabs.
    pub storage_events: Rc<dyn StorageEvents>,
    /// Same-tab change broadcast.
    pub changes: Rc<dyn ChangeChannel>,
    /// Wall clock for the session start and uptime.
    pub clock: Rc<dyn Clock>,
}

impl SessionPorts {
    /// Memory store, no cross-tab events, local channel, system clock.
    pub fn in_memory() -> Self {
        Self {
            store: Rc::new(MemoryKeyValueStore::default()),
            storage_events: Rc::new(NoopStorageEvents),
            changes: Rc::new(LocalChangeChannel::default()),
            clock: Rc::new(SystemClock),
        }
    }
}

/// Result of a theme change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSelection {
    /// The requested id was applied.
    Applied(String),
    /// The requested id is not in the catalog; the default was applied instead.
    FellBack {
        /// Id as requested.
        requested: String,
        /// Id actually applied.
        applied: String,
    },
}

impl ThemeSelection {
    /// Id now active.
    pub fn applied(&self) -> &str {
        match self {
            Self::Applied(id) | Self::FellBack { applied: id, .. } => id,
        }
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    actor: String,
    theme: String,
    session_start_ms: u64,
    processing: bool,
}

struct SessionInner {
    state: RefCell<SessionState>,
    default_actor: String,
    default_theme: String,
    actor_key: String,
    theme_key: String,
    catalog: ThemeCatalog,
    store: Rc<dyn KeyValueStore>,
    changes: Rc<dyn ChangeChannel>,
    clock: Rc<dyn Clock>,
    external: RefCell<Option<Subscription>>,
}

/// Shared handle to one tab's session.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    /// Starts a session: reads persisted values (defaulting when absent or unreadable), stamps
    /// the start instant, and subscribes to changes from other tabs.
    pub fn start(config: &InterpreterConfig, catalog: ThemeCatalog, ports: SessionPorts) -> Self {
        let default_actor = resolve_label(&config.default_actor, DEFAULT_ACTOR);
        let default_theme = if catalog.contains(&config.default_theme) {
            config.default_theme.clone()
        } else {
            catalog.default_id().to_string()
        };
        let mut inner = SessionInner {
            state: RefCell::new(SessionState {
                actor: default_actor.clone(),
                theme: default_theme.clone(),
                session_start_ms: ports.clock.now_ms(),
                processing: false,
            }),
            default_actor,
            default_theme,
            actor_key: config.actor_key.clone(),
            theme_key: config.theme_key.clone(),
            catalog,
            store: ports.store,
            changes: ports.changes,
            clock: ports.clock,
            external: RefCell::new(None),
        };
        let actor = inner.load_field(&inner.actor_key).map(|raw| inner.resolve_actor(&raw));
        let theme = inner
            .load_field(&inner.theme_key)
            .map(|raw| inner.resolve_theme(&raw).applied().to_string());
        {
            let state = inner.state.get_mut();
            if let Some(actor) = actor {
                state.actor = actor;
            }
            if let Some(theme) = theme {
                state.theme = theme;
            }
        }

        let session = Self {
            inner: Rc::new(inner),
        };
        let weak: Weak<SessionInner> = Rc::downgrade(&session.inner);
        let subscription = ports
            .storage_events
            .subscribe(Rc::new(move |change: &StorageChange| {
                if let Some(inner) = weak.upgrade() {
                    Session { inner }.apply_external(change);
                }
            }));
        session.inner.external.replace(Some(subscription));
        session
    }

    /// Point-in-time copy of the session state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.borrow();
        SessionSnapshot {
            actor: state.actor.clone(),
            theme: state.theme.clone(),
            session_start_ms: state.session_start_ms,
            processing: state.processing,
        }
    }

    /// Current actor label.
    pub fn actor(&self) -> String {
        self.inner.state.borrow().actor.clone()
    }

    /// Current theme id.
    pub fn theme(&self) -> String {
        self.inner.state.borrow().theme.clone()
    }

    /// Whether a dispatch is in flight.
    pub fn is_processing(&self) -> bool {
        self.inner.state.borrow().processing
    }

    /// Elapsed time since the session started.
    pub fn uptime(&self) -> Duration {
        let start = self.inner.state.borrow().session_start_ms;
        Duration::from_millis(self.inner.clock.now_ms().saturating_sub(start))
    }

    /// Theme catalog backing [`Session::set_theme`].
    pub fn catalog(&self) -> &ThemeCatalog {
        &self.inner.catalog
    }

    /// Sets the actor label. Blank input selects the default label. Returns the applied label.
    pub fn set_actor(&self, name: &str) -> String {
        let actor = self.inner.resolve_actor(name);
        self.inner.state.borrow_mut().actor = actor.clone();
        self.inner.persist(&self.inner.actor_key, &actor);
        self.inner.changes.publish(&SessionChange::Actor(actor.clone()));
        actor
    }

    /// Switches the theme. Unknown ids select the default theme; invalid ids are never stored.
    pub fn set_theme(&self, id: &str) -> ThemeSelection {
        let selection = self.inner.resolve_theme(id);
        let applied = selection.applied().to_string();
        self.inner.state.borrow_mut().theme = applied.clone();
        self.inner.persist(&self.inner.theme_key, &applied);
        self.inner.changes.publish(&SessionChange::Theme(applied));
        selection
    }

    /// Registers a same-tab listener for actor/theme changes, including ones that arrive from
    /// other tabs.
    pub fn subscribe(&self, listener: ChangeListener) -> Subscription {
        self.inner.changes.subscribe(listener)
    }

    /// Applies a change written by another tab. Untracked keys are ignored; the value is not
    /// written back to the store.
    pub fn apply_external(&self, change: &StorageChange) {
        let inner = &self.inner;
        let update = if change.key == inner.actor_key {
            let actor = match inner.decode_external(change) {
                Some(raw) => inner.resolve_actor(&raw),
                None => inner.default_actor.clone(),
            };
            inner.replace_actor(actor)
        } else if change.key == inner.theme_key {
            let theme = match inner.decode_external(change) {
                Some(raw) => inner.resolve_theme(&raw).applied().to_string(),
                None => inner.default_theme.clone(),
            };
            inner.replace_theme(theme)
        } else {
            None
        };
        if let Some(update) = update {
            inner.changes.publish(&update);
        }
    }

    pub(crate) fn set_processing(&self, processing: bool) {
        self.inner.state.borrow_mut().processing = processing;
    }
}

impl SessionInner {
    fn resolve_actor(&self, name: &str) -> String {
        resolve_label(name, &self.default_actor)
    }

    fn resolve_theme(&self, id: &str) -> ThemeSelection {
        match self.catalog.resolve(id) {
            Some(known) => ThemeSelection::Applied(known.to_string()),
            None => ThemeSelection::FellBack {
                requested: id.trim().to_string(),
                applied: self.default_theme.clone(),
            },
        }
    }

    fn replace_actor(&self, actor: String) -> Option<SessionChange> {
        let mut state = self.state.borrow_mut();
        if state.actor == actor {
            return None;
        }
        state.actor = actor.clone();
        Some(SessionChange::Actor(actor))
    }

    fn replace_theme(&self, theme: String) -> Option<SessionChange> {
        let mut state = self.state.borrow_mut();
        if state.theme == theme {
            return None;
        }
        state.theme = theme.clone();
        Some(SessionChange::Theme(theme))
    }

    fn load_field(&self, key: &str) -> Option<String> {
        match self.read_field(key) {
            Ok(value) => value,
            Err(err) => {
                logging::warn!("{err}; using default");
                None
            }
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(err) = self.write_field(key, value) {
            logging::warn!("{err}");
        }
    }

    fn read_field(&self, key: &str) -> Result<Option<String>, ShellError> {
        load_typed_with::<_, String>(self.store.as_ref(), key).map_err(|err| {
            ShellError::persistence(format!("session load of `{key}` failed: {err}"))
        })
    }

    fn write_field(&self, key: &str, value: &str) -> Result<(), ShellError> {
        save_typed_with(self.store.as_ref(), key, &value).map_err(|err| {
            ShellError::persistence(format!("session persist of `{key}` failed: {err}"))
        })
    }

    fn decode_external(&self, change: &StorageChange) -> Option<String> {
        let raw = change.new_value.as_deref()?;
        match serde_json::from_str::<String>(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                logging::warn!("ignoring malformed external `{}` value: {err}", change.key);
                None
            }
        }
    }
}

fn resolve_label(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pitwall_contract::ErrorKind;
    use pitwall_host::{ManualClock, SharedMemoryStorage, StoreError, DEFAULT_THEME_ID};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{ACTOR_KEY, THEME_KEY};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("security policy".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("quota exceeded".to_string()))
        }
    }

    fn start_with_store(store: Rc<dyn KeyValueStore>) -> Session {
        Session::start(
            &InterpreterConfig::default(),
            ThemeCatalog::builtin(),
            SessionPorts {
                store,
                ..SessionPorts::in_memory()
            },
        )
    }

    fn tab_session(shared: &SharedMemoryStorage) -> Session {
        let tab = Rc::new(shared.tab());
        Session::start(
            &InterpreterConfig::default(),
            ThemeCatalog::builtin(),
            SessionPorts {
                store: tab.clone(),
                storage_events: tab,
                changes: Rc::new(LocalChangeChannel::default()),
                clock: Rc::new(ManualClock::at(0)),
            },
        )
    }

    #[test]
    fn fresh_session_uses_defaults() {
        let session = Session::start(
            &InterpreterConfig::default(),
            ThemeCatalog::builtin(),
            SessionPorts::in_memory(),
        );
        let snapshot = session.snapshot();
        assert_eq!(snapshot.actor, DEFAULT_ACTOR);
        assert_eq!(snapshot.theme, DEFAULT_THEME_ID);
        assert!(!snapshot.processing);
    }

    #[test]
    fn blank_actor_resolves_to_default() {
        let session = start_with_store(Rc::new(MemoryKeyValueStore::default()));
        session.set_actor("pilot7");
        assert_eq!(session.set_actor(""), DEFAULT_ACTOR);
        assert_eq!(session.snapshot().actor, DEFAULT_ACTOR);
        session.set_actor("   ");
        assert_eq!(session.actor(), DEFAULT_ACTOR);
    }

    #[test]
    fn unknown_theme_resolves_to_default_and_is_not_stored() {
        let store = MemoryKeyValueStore::default();
        let session = start_with_store(Rc::new(store.clone()));
        session.set_theme("amber");
        let selection = session.set_theme("nonexistent-id");

        assert_eq!(
            selection,
            ThemeSelection::FellBack {
                requested: "nonexistent-id".to_string(),
                applied: DEFAULT_THEME_ID.to_string(),
            }
        );
        assert_eq!(session.snapshot().theme, DEFAULT_THEME_ID);
        assert_eq!(
            store.get(THEME_KEY).expect("get"),
            Some(format!("\"{DEFAULT_THEME_ID}\""))
        );
    }

    #[test]
    fn persisted_actor_survives_a_new_session() {
        let store = MemoryKeyValueStore::default();
        start_with_store(Rc::new(store.clone())).set_actor("pilot7");

        let reloaded = start_with_store(Rc::new(store));
        assert_eq!(reloaded.snapshot().actor, "pilot7");
    }

    #[test]
    fn unreadable_store_falls_back_to_defaults() {
        let store = MemoryKeyValueStore::default();
        store.set(ACTOR_KEY, "{not json").expect("set");
        store.set(THEME_KEY, "\"vaporwave\"").expect("set");
        let session = start_with_store(Rc::new(store));
        assert_eq!(session.actor(), DEFAULT_ACTOR);
        assert_eq!(session.theme(), DEFAULT_THEME_ID);
    }

    #[test]
    fn failing_store_is_not_fatal() {
        let session = start_with_store(Rc::new(BrokenStore));
        assert_eq!(session.actor(), DEFAULT_ACTOR);
        assert_eq!(session.set_actor("pilot7"), "pilot7");
        assert_eq!(session.actor(), "pilot7");
        assert_eq!(session.set_theme("amber").applied(), "amber");
    }

    #[test]
    fn store_failures_are_classified_as_persistence_errors() {
        let session = start_with_store(Rc::new(BrokenStore));
        let read = session.inner.read_field(ACTOR_KEY).expect_err("read should fail");
        assert_eq!(read.kind, ErrorKind::Persistence);
        assert!(read.message.contains("security policy"));

        let write = session
            .inner
            .write_field(THEME_KEY, "amber")
            .expect_err("write should fail");
        assert_eq!(write.kind, ErrorKind::Persistence);
        assert!(write.message.contains("quota exceeded"));
    }

    #[test]
    fn local_listeners_see_changes_immediately() {
        let session = start_with_store(Rc::new(MemoryKeyValueStore::default()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = session.subscribe(Rc::new(move |change: &SessionChange| {
            sink.borrow_mut().push(change.clone());
        }));

        session.set_actor("pilot7");
        session.set_theme("redline");

        assert_eq!(
            seen.borrow().as_slice(),
            &[
                SessionChange::Actor("pilot7".to_string()),
                SessionChange::Theme("redline".to_string()),
            ]
        );
    }

    #[test]
    fn other_tabs_observe_changes_without_polling() {
        let shared = SharedMemoryStorage::default();
        let tab_a = tab_session(&shared);
        let tab_b = tab_session(&shared);
        let seen_b = Rc::new(RefCell::new(Vec::new()));
        let sink = seen_b.clone();
        let _subscription = tab_b.subscribe(Rc::new(move |change: &SessionChange| {
            sink.borrow_mut().push(change.clone());
        }));

        tab_a.set_actor("pilot7");
        tab_a.set_theme("papaya");

        assert_eq!(tab_b.actor(), "pilot7");
        assert_eq!(tab_b.theme(), "papaya");
        assert_eq!(seen_b.borrow().len(), 2);
    }

    #[test]
    fn last_write_wins_across_tabs() {
        let shared = SharedMemoryStorage::default();
        let tab_a = tab_session(&shared);
        let tab_b = tab_session(&shared);

        tab_a.set_theme("amber");
        tab_b.set_theme("redline");

        assert_eq!(tab_a.theme(), "redline");
        assert_eq!(tab_b.theme(), "redline");
        assert_eq!(shared.peek(THEME_KEY).as_deref(), Some("\"redline\""));
    }

    #[test]
    fn external_changes_tolerate_unknown_keys_and_bad_values() {
        let session = start_with_store(Rc::new(MemoryKeyValueStore::default()));
        session.set_actor("pilot7");
        session.set_theme("amber");

        session.apply_external(&StorageChange {
            key: "someone.else".to_string(),
            new_value: Some("42".to_string()),
        });
        assert_eq!(session.actor(), "pilot7");

        session.apply_external(&StorageChange {
            key: THEME_KEY.to_string(),
            new_value: Some("\"vaporwave\"".to_string()),
        });
        assert_eq!(session.theme(), DEFAULT_THEME_ID);

        session.apply_external(&StorageChange {
            key: ACTOR_KEY.to_string(),
            new_value: None,
        });
        assert_eq!(session.actor(), DEFAULT_ACTOR);
    }

    #[test]
    fn uptime_tracks_the_clock() {
        let clock = ManualClock::at(10_000);
        let session = Session::start(
            &InterpreterConfig::default(),
            ThemeCatalog::builtin(),
            SessionPorts {
                clock: Rc::new(clock.clone()),
                ..SessionPorts::in_memory()
            },
        );
        clock.advance(Duration::from_secs(65));
        assert_eq!(session.uptime(), Duration::from_secs(65));
        assert_eq!(session.snapshot().session_start_ms, 10_000);
    }

    #[test]
    fn dropped_session_stops_listening() {
        let shared = SharedMemoryStorage::default();
        let tab_a = tab_session(&shared);
        drop(tab_session(&shared));
        tab_a.set_actor("pilot7");
        assert_eq!(tab_a.actor(), "pilot7");
    }
}
