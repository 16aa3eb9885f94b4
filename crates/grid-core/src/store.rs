//! Key/value persistence for daily progress.
//!
//! The engine only needs three keys and two value types, so the contract is
//! deliberately small: platform front ends implement [`PreferenceStore`] over
//! whatever preference API they have, while [`MemoryStore`] and
//! [`JsonFileStore`] cover tests and desktop hosts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Remaining tries for the stored day (int, default 5)
pub const TRIES_KEY: &str = "tries_remaining";
/// Day index the stored progress belongs to (int)
pub const DAY_KEY: &str = "day_index";
/// Whether the stored day is finished (bool, default false)
pub const COMPLETED_KEY: &str = "completed";

/// A stored preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Int(i64),
    Bool(bool),
}

impl StoredValue {
    pub fn as_int(self) -> Option<i64> {
        match self {
            StoredValue::Int(v) => Some(v),
            StoredValue::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            StoredValue::Bool(v) => Some(v),
            StoredValue::Int(_) => None,
        }
    }
}

/// Persistent key/value preferences
pub trait PreferenceStore {
    /// Read a value; `None` when absent
    fn get(&self, key: &str) -> Option<StoredValue>;

    /// Write a single value
    fn set(&mut self, key: &str, value: StoredValue) -> Result<()>;

    /// Write several values as one batch. Stores that can commit a batch
    /// atomically should override this.
    fn set_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, *value)?;
        }
        Ok(())
    }

    /// Read an integer; values of another type read as absent
    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(StoredValue::as_int)
    }

    /// Read a boolean; values of another type read as absent
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(StoredValue::as_bool)
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn get(&self, key: &str) -> Option<StoredValue> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<()> {
        (**self).set(key, value)
    }

    fn set_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<()> {
        (**self).set_all(entries)
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
    /// Reject all writes (for exercising retry paths)
    fail_writes: bool,
    /// Number of successful batches/writes
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries
    pub fn with_entries(entries: &[(&str, StoredValue)]) -> Self {
        let mut store = Self::new();
        for (key, value) in entries {
            store.values.insert((*key).to_string(), *value);
        }
        store
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful commits so far
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    fn set_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<()> {
        if self.fail_writes {
            return Err(Error::Rejected("memory store is read-only".to_string()));
        }
        for (key, value) in entries {
            self.values.insert((*key).to_string(), *value);
        }
        self.commits += 1;
        Ok(())
    }
}

/// Preferences kept as a flat JSON object in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoredValue>,
}

impl JsonFileStore {
    /// Default file location in the platform's local data directory
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("beat_the_grid.json")
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path())
    }

    /// Open a store. A missing file starts out empty; a file that cannot be
    /// read or decoded is an error and is left untouched.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    values: BTreeMap::new(),
                });
            }
            Err(source) => {
                log::warn!("cannot read preference file {}: {source}", path.display());
                return Err(Error::Io { path, source });
            }
        };
        match serde_json::from_str(&json) {
            Ok(values) => Ok(Self { path, values }),
            Err(source) => {
                log::warn!("corrupt preference file {}: {source}", path.display());
                Err(Error::Decode { path, source })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full map through a temporary file so readers never see a partial file
    fn persist(&self, values: &BTreeMap<String, StoredValue>) -> Result<()> {
        let json = serde_json::to_string_pretty(values)?;
        let io_err = |source: std::io::Error| Error::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<()> {
        self.set_all(&[(key, value)])
    }

    fn set_all(&mut self, entries: &[(&str, StoredValue)]) -> Result<()> {
        let mut next = self.values.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), *value);
        }
        // Only adopt the new map once it is on disk
        self.persist(&next)?;
        self.values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn temp_path(name: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("grid-core-store-{}-{n}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get(TRIES_KEY).is_none());

        store.set(TRIES_KEY, StoredValue::Int(3)).unwrap();
        store.set(COMPLETED_KEY, StoredValue::Bool(true)).unwrap();

        assert_eq!(store.get_int(TRIES_KEY), Some(3));
        assert_eq!(store.get_bool(COMPLETED_KEY), Some(true));
        assert_eq!(store.commits(), 2);
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let store = MemoryStore::with_entries(&[(TRIES_KEY, StoredValue::Bool(false))]);
        assert_eq!(store.get_int(TRIES_KEY), None);
        assert_eq!(store.get_bool(TRIES_KEY), Some(false));
    }

    #[test]
    fn test_memory_store_rejects_writes_atomically() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);
        let result = store.set_all(&[
            (DAY_KEY, StoredValue::Int(4)),
            (TRIES_KEY, StoredValue::Int(2)),
        ]);
        assert!(matches!(result, Err(Error::Rejected(_))));
        assert!(store.is_empty());
        assert_eq!(store.commits(), 0);
    }

    #[test]
    fn test_json_file_store_persists_across_opens() {
        let path = temp_path("prefs.json");
        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .set_all(&[
                    (DAY_KEY, StoredValue::Int(12)),
                    (TRIES_KEY, StoredValue::Int(4)),
                    (COMPLETED_KEY, StoredValue::Bool(false)),
                ])
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_int(DAY_KEY), Some(12));
        assert_eq!(reopened.get_int(TRIES_KEY), Some(4));
        assert_eq!(reopened.get_bool(COMPLETED_KEY), Some(false));

        let json = fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(raw["day_index"], 12);
        assert_eq!(raw["completed"], false);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_file_store_refuses_corrupt_file() {
        let path = temp_path("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(Error::Decode { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_file_store_refuses_undecodable_file() {
        let path = temp_path("finished.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut bytes = br#"{"day_index":7,"tries_remaining":0,"completed":true}"#.to_vec();
        bytes.push(0xFF);
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(JsonFileStore::open(&path), Err(Error::Io { .. })));
        // The finished day must not be replaced by a fresh budget
        assert_eq!(fs::read(&path).unwrap(), bytes);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let store = JsonFileStore::open(temp_path("missing.json")).unwrap();
        assert!(store.get(TRIES_KEY).is_none());
        assert_eq!(store.path().file_name().unwrap(), "missing.json");
    }
}
