//! Durable key-value storage for the serialized cart.
//!
//! The cart store writes through to a [`CartStorage`] after every successful
//! mutation and reads it only once, at startup.
//!
//! # Backends
//!
//! - [`FileStorage`] - one JSON file per key inside a directory
//! - [`MemoryStorage`] - process-local map, shared between clones

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use rocketshoes_core::CartItem;
use thiserror::Error;

/// Key the cart blob is stored under unless configured otherwise.
pub const CART_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Cart could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage holding one serialized blob per key.
pub trait CartStorage {
    /// Read the blob stored under `key`, or `None` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Serialize a cart into the stored blob format.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if serialization fails.
pub fn serialize_cart(cart: &[CartItem]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(cart)?)
}

/// Parse a stored blob back into a cart.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if the blob is not a valid cart.
pub fn deserialize_cart(blob: &str) -> Result<Vec<CartItem>, StorageError> {
    Ok(serde_json::from_str(blob)?)
}

// =============================================================================
// FileStorage
// =============================================================================

/// Stores each key as `<dir>/<escaped key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a crash
/// mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl CartStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage. Clones share the same map, so a clone kept by a test
/// observes what the cart store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory storage holding `blob` under `key`.
    #[must_use]
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        storage
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
