//! Error types for shelf operations.

use shelfsync_storage::StoreError;
use thiserror::Error;

/// Result type for shelf operations.
pub type ShelfResult<T> = Result<T, ShelfError>;

/// Errors that can occur during shelf operations.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A record must have non-empty text.
    #[error("record text is empty")]
    EmptyText,

    /// No record with this id.
    #[error("no record with id {0:?}")]
    NotFound(String),

    /// The stored collection is not a list of records.
    #[error("stored collection is malformed: {0}")]
    Malformed(String),

    /// Import input is neither a record list nor an export document.
    #[error("import failed: {0}")]
    Import(String),

    /// Export serialization failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl ShelfError {
    pub(crate) fn malformed(e: impl std::fmt::Display) -> Self {
        ShelfError::Malformed(e.to_string())
    }

    pub(crate) fn import(e: impl std::fmt::Display) -> Self {
        ShelfError::Import(e.to_string())
    }
}
