//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored document could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A single item exceeds the store's per-item byte ceiling.
    #[error("item {key:?} is {size} bytes, exceeding the {limit} byte quota")]
    QuotaExceeded {
        /// Key of the offending item.
        key: String,
        /// Size of key plus serialized value.
        size: usize,
        /// Configured per-item limit.
        limit: usize,
    },

    /// The store is temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The backing file is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Returns true if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Unavailable(_))
    }
}
