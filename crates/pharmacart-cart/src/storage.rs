//! Durable client-side key/value storage.
//!
//! Plays the role browser local storage plays for the web storefront: a flat
//! map of string keys to JSON text. [`FileStore`] keeps one file per key under
//! a data directory; [`MemoryStore`] backs tests and short-lived sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Everything but ASCII alphanumerics, `-` and `_` is escaped in file names.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

pub trait KeyValueStore: Send + Sync {
    /// Returns the raw text stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside `dir`.
///
/// Writes go to a temporary sibling first and are renamed into place so a
/// crash mid-write never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the storage directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
            key: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Percent-encodes `key`, so distinct keys always get distinct files.
    fn path_for(&self, key: &str) -> PathBuf {
        let file_name = utf8_percent_encode(key, FILE_NAME);
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                key: key.to_owned(),
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |e| StorageError::Io {
            key: key.to_owned(),
            source: e,
        };
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io {
                key: key.to_owned(),
                source: e,
            }),
        }
    }
}

/// Reads and decodes the JSON value stored under `key`.
///
/// Unreadable or undecodable data is treated as absent: it is logged, the key
/// is deleted so the next read starts clean, and `None` is returned.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "local storage read failed; treating as empty");
            return None;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "corrupted local storage entry; resetting");
            discard(store, key);
            None
        }
    }
}

/// Encodes `value` as JSON and stores it under `key`.
///
/// # Errors
///
/// Returns [`StorageError::Serialize`] if encoding fails or
/// [`StorageError::Io`] if the store rejects the write.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let text = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
        key: key.to_owned(),
        source: e,
    })?;
    store.set(key, &text)
}

/// Deletes `key`, logging instead of failing.
pub fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove local storage entry");
    }
}
