//! Persistent key-value storage and its cross-tab change notifications.

pub mod events;
pub mod kv;
