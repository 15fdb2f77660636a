//! JSON file-backed key-value store.
//!
//! All keys live in one human-readable JSON file. Writes go to a temporary file
//! first and are then renamed over the target, so a crash never leaves a
//! half-written file behind.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(log n) from the in-memory map, loaded once on open
//! - **Write**: O(n), the whole map is serialized on every change
//! - **Best for**: a handful of small per-screen entries written on user action

use crate::domain::error::{AptdeskError, Result};
use crate::storage::backend::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk container format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    /// Format version for future migrations.
    version: u32,

    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

/// Key-value store persisted to a JSON file.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "entries": {
///     "householdListPreferences": "{\"viewMode\":\"table\",\"itemsPerPage\":20}",
///     "householdListSearchHistory": "[\"A-101\",\"Tran\"]"
///   }
/// }
/// ```
pub struct JsonStore {
    file_path: PathBuf,
    data: StoreFile,
    dirty: bool,
}

impl JsonStore {
    /// Opens the store at `file_path`, creating parent directories as needed.
    ///
    /// A missing file starts an empty store; the file is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file
    /// exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use aptdesk::storage::{JsonStore, KeyValueStore};
    /// use std::path::PathBuf;
    ///
    /// let mut store = JsonStore::open(PathBuf::from("/tmp/aptdesk/storage.json"))?;
    /// store.set("residentListSearchHistory", "[]")?;
    /// # Ok::<(), aptdesk::domain::AptdeskError>(())
    /// ```
    pub fn open(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "opening JSON store");

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load(&file_path)?
        } else {
            StoreFile::default()
        };

        tracing::debug!(entries = data.entries.len(), "JSON store ready");

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    fn load(path: &Path) -> Result<StoreFile> {
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        let data: StoreFile = serde_json::from_str(&contents)
            .map_err(|e| AptdeskError::Storage(format!("failed to parse {}: {e}", path.display())))?;
        tracing::debug!(version = data.version, "loaded store file");
        Ok(data)
    }

    /// Writes pending changes to disk. A no-op when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| AptdeskError::Storage(format!("failed to serialize store: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!(path = ?self.file_path, "store flushed");
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _span = tracing::debug_span!("store_get", key).entered();
        Ok(self.data.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let _span = tracing::debug_span!("store_set", key, len = value.len()).entered();
        if self.data.entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        self.data.entries.insert(key.to_string(), value.to_string());
        self.dirty = true;
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let _span = tracing::debug_span!("store_remove", key).entered();
        if self.data.entries.remove(key).is_some() {
            self.dirty = true;
            self.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonStore {
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("flushing dirty store on drop");
            if let Err(e) = self.flush() {
                tracing::error!(error = %e, "failed to flush store on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        {
            let mut store = JsonStore::open(path.clone()).unwrap();
            store.set("householdListPreferences", r#"{"itemsPerPage":20}"#).unwrap();
            store.set("scratch", "1").unwrap();
            store.remove("scratch").unwrap();
        }

        let store = JsonStore::open(path).unwrap();
        assert_eq!(
            store.get("householdListPreferences").unwrap().as_deref(),
            Some(r#"{"itemsPerPage":20}"#)
        );
        assert!(store.get("scratch").unwrap().is_none());
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = JsonStore::open(path.clone()).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{oops").unwrap();
        let err = JsonStore::open(path).err().unwrap();
        assert!(matches!(err, AptdeskError::Storage(_)));
    }
}
