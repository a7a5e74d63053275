//! Storage traits and error types
//!
//! Persistence is an opaque key-value capability: the crawler only ever
//! reads and writes whole values by key.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value persistence backend
///
/// Implementations must be shareable across crawl workers. The crawler
/// assumes at most one writer per key per run, so no write-write conflict
/// handling is required of implementations.
pub trait BlobStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()>;
}
