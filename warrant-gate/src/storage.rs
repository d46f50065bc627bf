//! Durable key/value storage for the session token.
//!
//! The provider reads one slot ([`SESSION_TOKEN_KEY`]) once at mount time and
//! writes it on every [`crate::WarrantContext::set_token`]. Writes are
//! synchronous so a token survives a reload as soon as the setter returns.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Storage key holding the session token.
pub const SESSION_TOKEN_KEY: &str = "__warrantSessionToken";

/// Errors that can occur in token storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to read from storage.
    #[error("Failed to read storage: {0}")]
    Read(String),

    /// Failed to write to storage.
    #[error("Failed to write storage: {0}")]
    Write(String),

    /// IO error during storage operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for durable string storage.
///
/// Mirrors the browser's `localStorage` contract: string keys, string values,
/// synchronous access.
pub trait TokenStorage: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value.
    ///
    /// Returns `true` if a value was removed, `false` if not found.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

/// In-memory storage.
///
/// Values are lost when the process exits. This is the default storage used
/// by [`crate::WarrantProvider`].
#[derive(Default)]
pub struct MemoryTokenStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.values.write().remove(key).is_some())
    }
}

/// File-backed storage.
///
/// Values are persisted as a JSON object. The file is created on the first
/// write and re-read lazily on first access.
pub struct FileTokenStorage {
    path: PathBuf,
    cache: RwLock<Option<HashMap<String, String>>>,
}

impl FileTokenStorage {
    /// Create a store at the given path.
    ///
    /// The file does not need to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Platform data directory location, e.g. `~/.local/share/warrant-gate/storage.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("warrant-gate").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_loaded(&self) -> Result<(), StorageError> {
        let mut cache = self.cache.write();
        if cache.is_some() {
            return Ok(());
        }

        let values = if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)?;
            if contents.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            HashMap::new()
        };

        *cache = Some(values);
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        let cache = self.cache.read();
        let Some(values) = cache.as_ref() else {
            return Err(StorageError::Write("storage cache not loaded".to_string()));
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.ensure_loaded()?;
        Ok(self
            .cache
            .read()
            .as_ref()
            .and_then(|values| values.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_loaded()?;
        if let Some(values) = self.cache.write().as_mut() {
            values.insert(key.to_string(), value.to_string());
        }
        self.flush()
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.ensure_loaded()?;
        let removed = self
            .cache
            .write()
            .as_mut()
            .is_some_and(|values| values.remove(key).is_some());
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }
}
