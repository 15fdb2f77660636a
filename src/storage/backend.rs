//! Key-value storage abstraction.
//!
//! This module defines the [`KeyValueStore`] trait that the preference, search
//! history, saved filter and activity log code persists through. It is the
//! narrow string-to-string interface a browser's local storage offers, so any
//! backend that can hold strings by key can serve it.
//!
//! # Implementations
//!
//! - [`JsonStore`](crate::storage::JsonStore): a single JSON file with atomic writes
//! - [`MemoryStore`]: process-local map, for tests and `--no-persist` runs

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::error::{AptdeskError, Result};

/// Durable client-side key-value storage.
///
/// # Examples
///
/// ```
/// use aptdesk::storage::{KeyValueStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// store.set("householdListPreferences", "{}")?;
/// assert_eq!(store.get("householdListPreferences")?.as_deref(), Some("{}"));
/// store.remove("householdListPreferences")?;
/// assert!(store.get("householdListPreferences")?.is_none());
/// # Ok::<(), aptdesk::domain::AptdeskError>(())
/// ```
pub trait KeyValueStore: Send {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Reads and decodes a JSON value stored under `key`.
///
/// A value that no longer decodes (for example after a format change) is
/// logged and treated as absent rather than failing the caller.
///
/// # Errors
///
/// Returns an error only if the store itself cannot be read.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding undecodable stored value");
            Ok(None)
        }
    }
}

/// Encodes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| AptdeskError::Storage(format!("failed to serialize {key}: {e}")))?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_helpers_round_trip_through_the_store() {
        let mut store = MemoryStore::new();
        write_json(&mut store, "terms", &vec!["A-101", "Tran"]).unwrap();
        let terms: Option<Vec<String>> = read_json(&store, "terms").unwrap();
        assert_eq!(terms.unwrap(), vec!["A-101", "Tran"]);
    }

    #[test]
    fn corrupt_values_read_as_absent() {
        let mut store = MemoryStore::new();
        store.set("terms", "{not json").unwrap();
        let terms: Option<Vec<String>> = read_json(&store, "terms").unwrap();
        assert!(terms.is_none());
    }
}
