//! Typed host-port contracts and in-memory adapters used by the session interpreter.
//!
//! This crate is the boundary for everything the interpreter does not own: the persistent
//! key-value store, cross-tab storage-change notifications, the same-tab change channel, wall
//! clock and timers, and the theme catalog. Concrete browser adapters live in
//! `pitwall_host_web`; the in-memory adapters here back native builds and tests.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod channel;
pub mod storage;
pub mod subscription;
pub mod theme;
pub mod time;

pub use channel::{ChangeChannel, ChangeListener, LocalChangeChannel};
pub use storage::events::{
    NoopStorageEvents, SharedMemoryStorage, StorageChange, StorageEvents, StorageListener,
    TabStorage,
};
pub use storage::kv::{
    load_typed_with, save_typed_with, KeyValueStore, MemoryKeyValueStore, StoreError,
};
pub use subscription::Subscription;
pub use theme::{Theme, ThemeCatalog, DEFAULT_THEME_ID};
#[cfg(not(target_arch = "wasm32"))]
pub use time::ThreadSleeper;
pub use time::{
    unix_time_ms_now, Clock, ManualClock, ManualSleeper, PendingSleeper, SleepFuture, Sleeper,
    SystemClock,
};
