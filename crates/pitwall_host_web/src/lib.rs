//! Browser (`wasm32`) implementations of the [`pitwall_host`] ports.
//!
//! - [`WebKeyValueStore`]: `window.localStorage`
//! - [`WindowStorageEvents`]: the window `storage` event, fired by other tabs
//! - [`WindowChangeChannel`]: a same-tab `CustomEvent` on `window`
//! - [`TimeoutSleeper`]: `setTimeout`
//!
//! Native builds compile every adapter against an inert or in-memory fallback so the workspace
//! builds and tests without a browser.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod channel;
pub mod events;
mod interop;
pub mod local_store;
pub mod timer;

pub use channel::{WindowChangeChannel, SESSION_CHANGE_EVENT};
pub use events::WindowStorageEvents;
pub use local_store::WebKeyValueStore;
pub use timer::TimeoutSleeper;
