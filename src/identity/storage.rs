//! Key/value persistence for the session, the console's equivalent of browser
//! local storage. Backends only move opaque strings; encoding lives in `session`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage i/o on {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed persisted session: {0}")]
    Malformed(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io { .. } => AppError::storage("storage_io".to_string(), e.to_string()),
            StorageError::Malformed(_) => AppError::storage("storage_malformed".to_string(), e.to_string()),
        }
    }
}

pub trait SessionStorage: Send + Sync {
    /// Raw persisted value, or None when nothing is stored.
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, raw: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON file on disk. Writes go through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&self, raw: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// In-process storage. Clones share the same slot, so a test can hand one
/// clone to a store, drop the store, and rehydrate a new one from another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn raw(&self) -> Option<String> { self.slot.lock().clone() }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> { Ok(self.slot.lock().clone()) }

    fn save(&self, raw: &str) -> Result<(), StorageError> {
        *self.slot.lock() = Some(raw.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock() = None;
        Ok(())
    }
}
