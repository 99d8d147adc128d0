//! `localStorage`-backed key-value store.

use pitwall_host::{KeyValueStore, StoreError};

#[cfg(target_arch = "wasm32")]
use crate::interop::{js_error_to_string, local_storage};

/// Key-value store backed by `window.localStorage`.
///
/// Native builds have no backing storage: reads report nothing stored and writes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebKeyValueStore;

impl KeyValueStore for WebKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage().map_err(StoreError::Unavailable)?;
            storage
                .get_item(key)
                .map_err(|err| StoreError::Read(js_error_to_string(err)))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage().map_err(StoreError::Unavailable)?;
            storage.set_item(key, value).map_err(|err| {
                StoreError::Write(format!("setItem failed: {}", js_error_to_string(err)))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, value);
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage().map_err(StoreError::Unavailable)?;
            storage.remove_item(key).map_err(|err| {
                StoreError::Write(format!("removeItem failed: {}", js_error_to_string(err)))
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use pitwall_host::{load_typed_with, save_typed_with};

    use super::*;

    #[test]
    fn native_fallback_stores_nothing() {
        let store = WebKeyValueStore;
        save_typed_with(&store, "pitwall.session.actor", &"pilot7").expect("save");
        let loaded: Option<String> =
            load_typed_with(&store, "pitwall.session.actor").expect("load");
        assert_eq!(loaded, None);
        assert!(store.remove("pitwall.session.actor").is_ok());
    }
}
