//! String-keyed key-value storage.
//!
//! The pairing store does not own a storage medium; it is handed one through
//! the [`KeyValueStorage`] trait. [`MemoryStorage`] backs tests and ephemeral
//! use, [`FileStorage`] persists the whole map as a single JSON file shared
//! between processes.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Error from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A synchronous, string-keyed key-value storage area.
///
/// Implementations are shared by reference (`Arc<dyn KeyValueStorage>`) and
/// must tolerate calls from multiple threads. No transactional discipline is
/// promised across calls; concurrent writers race and the last writer wins.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`, returning the value it held.
    ///
    /// Returning the prior value makes this an atomic get-and-delete, which
    /// single-use consumers rely on.
    fn remove(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// List every key currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
