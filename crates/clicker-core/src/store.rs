//! The persistence gateway: load and store opaque state blobs by key.
//!
//! Stores know nothing about the economy. They hold serialized text and
//! promise only "last store wins". Serialising concurrent read-modify-write
//! sequences is the job of [`crate::ledger::Ledger`], not of the store.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The one key this deployment keeps state under.
pub const PLAYER_KEY: &str = "global_state";

/// Errors a store backend can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store key '{0}'")]
    InvalidKey(String),

    #[error("store backend unavailable: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A key-value backend for serialized state.
pub trait StateStore: Send + Sync {
    /// The blob last stored under `key`, or `None` if nothing was stored.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Persist `blob` under `key`, replacing any previous value.
    fn store(&self, key: &str, blob: &str) -> Result<(), StoreError>;
}

impl<S: StateStore + ?Sized> StateStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        (**self).store(key, blob)
    }
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn store(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        (**self).store(key, blob)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn store(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` for storage. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_last_write_wins() {
        let store = MemoryStore::new();
        assert_eq!(store.load(PLAYER_KEY).unwrap(), None);

        store.store(PLAYER_KEY, "one").unwrap();
        store.store(PLAYER_KEY, "two").unwrap();
        assert_eq!(store.load(PLAYER_KEY).unwrap().as_deref(), Some("two"));
        assert_eq!(store.load("other").unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_and_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("nested"));
        assert_eq!(store.load(PLAYER_KEY).unwrap(), None);

        store.store(PLAYER_KEY, r#"{"balance":1}"#).unwrap();
        store.store(PLAYER_KEY, r#"{"balance":2}"#).unwrap();

        assert_eq!(
            store.load(PLAYER_KEY).unwrap().as_deref(),
            Some(r#"{"balance":2}"#)
        );
        assert!(store.dir().join("global_state.json").exists());
        assert!(!store.dir().join("global_state.json.tmp").exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        for key in ["", "../escape", "a/b", "with space"] {
            assert!(matches!(
                store.store(key, "x"),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
