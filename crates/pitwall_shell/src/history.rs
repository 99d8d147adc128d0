//! Append-only scrollback log.

use std::{cell::RefCell, rc::Rc};

use pitwall_contract::HistoryEntry;

/// Shared append-only history. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Rc<RefCell<Vec<HistoryEntry>>>,
}

impl HistoryStore {
    /// Appends one entry; the borrow is released before returning.
    pub fn append(&self, entry: HistoryEntry) {
        self.entries.borrow_mut().push(entry);
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().clone()
    }

    /// Entries in display order, newest first.
    pub fn newest_first(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().iter().rev().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
