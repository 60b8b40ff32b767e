//! Durable Store Module
//!
//! Key/value backends that carry the durable subset of the cache across
//! restarts. The cache treats these as best-effort: a failing backend
//! degrades persistence, never correctness.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{CacheError, Result};

// == Durable Store Trait ==
/// Durable key/value storage consumed by the persistence layer.
///
/// Implementations hold a small fixed set of logical keys (the entries
/// snapshot and the configuration document) and overwrite them in place.
pub trait DurableStore: Send + Sync + std::fmt::Debug {
    /// Reads the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

// == Memory Store ==
/// In-process store backed by a mutexed map.
///
/// Sharing one instance between two manager lifetimes simulates a restart
/// against the same storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| CacheError::Storage("memory store mutex poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| CacheError::Storage("memory store mutex poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// == File Store ==
/// Store that keeps one JSON document per logical key under a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Maps a logical key to a file path, sanitizing characters that are
    /// not filesystem-safe.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl DurableStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get_item("absent").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_set_and_get() {
        let store = MemoryStore::new();
        store.set_item("cache:entries", "{}").unwrap();
        assert_eq!(store.get_item("cache:entries").unwrap().unwrap(), "{}");
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryStore::new();
        store.set_item("k", "first").unwrap();
        store.set_item("k", "second").unwrap();
        assert_eq!(store.get_item("k").unwrap().unwrap(), "second");
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.get_item("cache:config").unwrap().is_none());
        store.set_item("cache:config", r#"{"version":1}"#).unwrap();
        assert_eq!(
            store.get_item("cache:config").unwrap().unwrap(),
            r#"{"version":1}"#
        );
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set_item("a/b:c", "value").unwrap();
        assert_eq!(store.get_item("a/b:c").unwrap().unwrap(), "value");
        // The file lands inside the store directory, not alongside it
        assert!(dir.path().join("a_b_c.json").exists());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set_item("k", "persisted").unwrap();
        }
        let reopened = FileStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get_item("k").unwrap().unwrap(), "persisted");
    }
}
