use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

const FILE_EXTENSION: &str = "json";

/// Opaque string key-value store the tally is persisted into.
pub trait KeyValueStore {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value as one unit.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Errors reported by store writes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key contained characters the store cannot address.
    #[error("store key '{0}' contains unsupported characters")]
    InvalidKey(String),
    /// The entry would exceed the configured quota.
    #[error("entry of {size} bytes exceeds the store quota of {quota} bytes")]
    QuotaExceeded {
        /// Size of the rejected entry in bytes.
        size: usize,
        /// Quota configured for the store in bytes.
        quota: usize,
    },
    /// The underlying file system rejected the write.
    #[error("could not write {}: {source}", .path.display())]
    Io {
        /// Path that failed to be written.
        path: PathBuf,
        /// Error reported by the operating system.
        source: io::Error,
    },
}

/// In-memory store with an optional per-entry byte quota.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store rejecting entries whose key and value exceed `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Returns the store with `value` preloaded under `key`, bypassing the quota.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.entries.insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let size = key.len() + value.len();
        if let Some(quota) = self.quota {
            if size > quota {
                return Err(StoreError::QuotaExceeded { size, quota });
            }
        }

        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store keeping one JSON file per key inside a directory.
///
/// Writes go to a temporary sibling file that is renamed into place, so a
/// reader never observes a partially written entry.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }

        Ok(self.dir.join(key).with_extension(FILE_EXTENSION))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key).ok()?;
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "failed to read store entry");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|source| io_error(&staging, source))?;
        fs::rename(&staging, &path).map_err(|source| io_error(&path, source))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
