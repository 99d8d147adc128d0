//! Same-tab session change channel.
//!
//! Listeners registered here react immediately to actor/theme changes made in the current tab.
//! Changes made in other tabs arrive through [`crate::StorageEvents`] instead.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use pitwall_contract::SessionChange;

use crate::Subscription;

/// Callback invoked for every published change.
pub type ChangeListener = Rc<dyn Fn(&SessionChange)>;

/// Publish/subscribe transport for same-tab session changes.
pub trait ChangeChannel {
    /// Delivers `change` to every current listener.
    fn publish(&self, change: &SessionChange);

    /// Registers a listener until the returned handle is dropped.
    fn subscribe(&self, listener: ChangeListener) -> Subscription;
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: BTreeMap<u64, ChangeListener>,
}

/// In-process change channel.
#[derive(Clone, Default)]
pub struct LocalChangeChannel {
    table: Rc<RefCell<ListenerTable>>,
}

impl ChangeChannel for LocalChangeChannel {
    fn publish(&self, change: &SessionChange) {
        // Listeners may subscribe or publish re-entrantly.
        let listeners = self
            .table
            .borrow()
            .listeners
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for listener in listeners {
            listener(change);
        }
    }

    fn subscribe(&self, listener: ChangeListener) -> Subscription {
        let id = {
            let mut table = self.table.borrow_mut();
            table.next_id = table.next_id.saturating_add(1);
            let id = table.next_id;
            table.listeners.insert(id, listener);
            id
        };
        let table: Weak<RefCell<ListenerTable>> = Rc::downgrade(&self.table);
        Subscription::new(Rc::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().listeners.remove(&id);
            }
        }))
    }
}
