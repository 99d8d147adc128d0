//! Cross-tab storage-change notifications.
//!
//! Browsers fire a `storage` event in every *other* tab that shares an origin whenever a key is
//! written. [`SharedMemoryStorage`] reproduces that behavior in memory so several simulated tabs
//! can be wired against one store in native builds and tests.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::{Rc, Weak},
};

use crate::{KeyValueStore, StoreError, Subscription};

/// One external key change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Changed key. Listeners must tolerate keys they do not track.
    pub key: String,
    /// New raw value, `None` when the key was removed.
    pub new_value: Option<String>,
}

/// Callback invoked for every external change.
pub type StorageListener = Rc<dyn Fn(&StorageChange)>;

/// Subscription source for changes written by other tabs.
pub trait StorageEvents {
    /// Registers a listener until the returned handle is dropped.
    fn subscribe(&self, listener: StorageListener) -> Subscription;
}

/// Event source that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorageEvents;

impl StorageEvents for NoopStorageEvents {
    fn subscribe(&self, _listener: StorageListener) -> Subscription {
        Subscription::noop()
    }
}

#[derive(Default)]
struct SharedState {
    values: HashMap<String, String>,
    next_tab: u64,
    next_listener: u64,
    listeners: BTreeMap<u64, (u64, StorageListener)>,
}

/// In-memory store shared by several simulated tabs.
#[derive(Clone, Default)]
pub struct SharedMemoryStorage {
    state: Rc<RefCell<SharedState>>,
}

impl SharedMemoryStorage {
    /// Opens a new tab view onto the shared store.
    pub fn tab(&self) -> TabStorage {
        let mut state = self.state.borrow_mut();
        state.next_tab = state.next_tab.saturating_add(1);
        TabStorage {
            tab_id: state.next_tab,
            state: self.state.clone(),
        }
    }

    /// Reads a raw value without going through a tab.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.state.borrow().values.get(key).cloned()
    }
}

/// One tab's view of a [`SharedMemoryStorage`].
#[derive(Clone)]
pub struct TabStorage {
    tab_id: u64,
    state: Rc<RefCell<SharedState>>,
}

impl TabStorage {
    fn notify_other_tabs(&self, change: StorageChange) {
        let listeners = self
            .state
            .borrow()
            .listeners
            .values()
            .filter(|(tab_id, _)| *tab_id != self.tab_id)
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(&change);
        }
    }
}

impl KeyValueStore for TabStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.borrow().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self
            .state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
        if previous.as_deref() != Some(value) {
            self.notify_other_tabs(StorageChange {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            });
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let previous = self.state.borrow_mut().values.remove(key);
        if previous.is_some() {
            self.notify_other_tabs(StorageChange {
                key: key.to_string(),
                new_value: None,
            });
        }
        Ok(())
    }
}

impl StorageEvents for TabStorage {
    fn subscribe(&self, listener: StorageListener) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_listener = state.next_listener.saturating_add(1);
            let id = state.next_listener;
            state.listeners.insert(id, (self.tab_id, listener));
            id
        };
        let state: Weak<RefCell<SharedState>> = Rc::downgrade(&self.state);
        Subscription::new(Rc::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().listeners.remove(&id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<StorageChange>>>, StorageListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (
            seen,
            Rc::new(move |change: &StorageChange| sink.borrow_mut().push(change.clone())),
        )
    }

    #[test]
    fn writes_notify_other_tabs_only() {
        let shared = SharedMemoryStorage::default();
        let tab_a = shared.tab();
        let tab_b = shared.tab();
        let (seen_a, listener_a) = recorder();
        let (seen_b, listener_b) = recorder();
        let _sub_a = tab_a.subscribe(listener_a);
        let _sub_b = tab_b.subscribe(listener_b);

        tab_a.set("pitwall.actor", "\"pilot7\"").expect("set");

        assert!(seen_a.borrow().is_empty());
        assert_eq!(
            seen_b.borrow().as_slice(),
            &[StorageChange {
                key: "pitwall.actor".to_string(),
                new_value: Some("\"pilot7\"".to_string()),
            }]
        );
        assert_eq!(tab_b.get("pitwall.actor").expect("get").as_deref(), Some("\"pilot7\""));
    }

    #[test]
    fn unchanged_writes_and_missing_removes_are_silent() {
        let shared = SharedMemoryStorage::default();
        let tab_a = shared.tab();
        let tab_b = shared.tab();
        let (seen_b, listener_b) = recorder();
        let _sub_b = tab_b.subscribe(listener_b);

        tab_a.set("k", "1").expect("set");
        tab_a.set("k", "1").expect("set");
        tab_a.remove("missing").expect("remove");
        tab_a.remove("k").expect("remove");

        assert_eq!(seen_b.borrow().len(), 2);
        assert_eq!(seen_b.borrow()[1].new_value, None);
        assert_eq!(shared.peek("k"), None);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let shared = SharedMemoryStorage::default();
        let tab_a = shared.tab();
        let tab_b = shared.tab();
        let (seen_b, listener_b) = recorder();
        drop(tab_b.subscribe(listener_b));

        tab_a.set("k", "1").expect("set");
        assert!(seen_b.borrow().is_empty());
    }
}
