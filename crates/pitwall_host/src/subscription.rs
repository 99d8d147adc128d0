//! Drop-based listener handles shared by every publish/subscribe port.

use std::{cell::Cell, rc::Rc};

/// Listener registration that unsubscribes when cancelled or dropped.
pub struct Subscription {
    unsubscribe: Rc<dyn Fn()>,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Creates a subscription handle from an unsubscribe callback.
    pub fn new(unsubscribe: Rc<dyn Fn()>) -> Self {
        Self {
            unsubscribe,
            active: Rc::new(Cell::new(true)),
        }
    }

    /// Creates a handle with nothing to release.
    pub fn noop() -> Self {
        Self::new(Rc::new(|| {}))
    }

    /// Unsubscribes the listener if it is still registered.
    pub fn cancel(&self) {
        if self.active.replace(false) {
            (self.unsubscribe)();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.active.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_runs_once_and_drop_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let subscription = Subscription::new(Rc::new(move || counter.set(counter.get() + 1)));
        subscription.cancel();
        assert_eq!(calls.get(), 1);
        drop(subscription);
        assert_eq!(calls.get(), 1);
    }
}
