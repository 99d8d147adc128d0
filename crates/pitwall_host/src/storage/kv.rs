//! Synchronous key-value store contract and adapters.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Failure reported by a [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store cannot be reached (for example, storage disabled by the browser).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A read failed.
    #[error("storage read failed: {0}")]
    Read(String),
    /// A write failed (quota or security restrictions).
    #[error("storage write failed: {0}")]
    Write(String),
    /// The stored value could not be encoded or decoded.
    #[error("stored value is malformed: {0}")]
    Malformed(String),
}

/// Host store for small values (JSON text per key). Writes replace the whole value.
pub trait KeyValueStore {
    /// Reads the raw value for `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the raw value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store keyed by string.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }
}

/// Loads and deserializes a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when the store read or JSON decoding fails.
pub fn load_typed_with<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| StoreError::Malformed(e.to_string()))?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when JSON encoding or the store write fails.
pub fn save_typed_with<S: KeyValueStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Malformed(e.to_string()))?;
    store.set(key, &raw)
}
