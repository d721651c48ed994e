//! Durable key/value storage.
//!
//! Everything the client persists goes through [`KeyValueStore`]: a string
//! key maps to a string value, and nothing else is touched. This keeps the
//! session and collection stores independent of where the bytes actually
//! live (a JSON file for the CLI, memory for tests).
//!
//! # Keys
//!
//! ```text
//! session.credential   -> raw bearer token
//! session.identity     -> Identity JSON
//! cart:{user_id}       -> [CartLine] JSON
//! favorites:{user_id}  -> [MenuItem] JSON
//! ```
//!
//! Values that fail to decode are never surfaced: [`read_json`] logs them,
//! removes the key and reports the value as absent.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from storage writes and typed reads.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("storage encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store refuses writes (full or read-only).
    #[error("storage is read-only")]
    ReadOnly,

    /// A stored value exists but does not decode.
    #[error("corrupt stored data under {key}: {reason}")]
    CorruptStoredData {
        /// Key holding the bad value.
        key: String,
        /// Decoder message.
        reason: String,
    },
}

/// A durable string key/value store.
///
/// Implementations must not panic on malformed content and must not touch
/// any key other than the one named.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Absent keys return `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value could not be made durable. The
    /// previous value is left in place.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the removal could not be made durable.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage handle shared between the session and collection stores.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and decode a JSON value.
///
/// # Errors
///
/// Returns `StorageError::CorruptStoredData` if the value exists but does
/// not decode as `T`. The key is left untouched.
pub fn try_read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StorageError::CorruptStoredData {
            key: key.to_owned(),
            reason: e.to_string(),
        })
}

/// Read and decode a JSON value, recovering from corruption.
///
/// A value that fails to decode is logged, removed, and treated as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match try_read_json(store, key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "Discarding unreadable stored value");
            discard(store, key);
            None
        }
    }
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns `StorageError` if encoding or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(value)?;
    store.set(key, &encoded)
}

/// Remove a key, logging instead of failing.
pub fn discard(store: &dyn KeyValueStore, key: &str) {
    if let Err(err) = store.remove(key) {
        tracing::warn!(key, error = %err, "Failed to remove stored value");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_absent() {
        let store = MemoryStore::new();
        assert_eq!(read_json::<Vec<u32>>(&store, "cart:1"), None);
    }

    #[test]
    fn test_read_json_corrupt_is_removed() {
        let store = MemoryStore::new();
        store.set("cart:1", "{not json").unwrap();

        assert!(matches!(
            try_read_json::<Vec<u32>>(&store, "cart:1"),
            Err(StorageError::CorruptStoredData { .. })
        ));
        assert!(store.get("cart:1").is_some());

        assert_eq!(read_json::<Vec<u32>>(&store, "cart:1"), None);
        assert_eq!(store.get("cart:1"), None);
    }

    #[test]
    fn test_wrong_shape_counts_as_corrupt() {
        let store = MemoryStore::new();
        store.set("cart:1", r#"{"items": 3}"#).unwrap();
        assert_eq!(read_json::<Vec<u32>>(&store, "cart:1"), None);
        assert_eq!(store.get("cart:1"), None);
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        write_json(&store, "favorites:2", &[1_u32, 2, 3]).unwrap();
        assert_eq!(
            read_json::<Vec<u32>>(&store, "favorites:2"),
            Some(vec![1, 2, 3])
        );
    }
}
