//! Error types for the sync engine.

use shelfsync_codec::CodecError;
use shelfsync_storage::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// None of these is ever surfaced to the user as a hard failure: the engine
/// logs them, abandons the current propagation and waits for the next
/// trigger.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Local or remote store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Encoding or chunking failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The reassembled remote payload could not be parsed.
    #[error("malformed remote payload: {0}")]
    MalformedPayload(String),

    /// The local collection value is not a list of records.
    #[error("malformed local collection under {key:?}: {message}")]
    MalformedCollection {
        /// Local store key.
        key: String,
        /// Parse error.
        message: String,
    },

    /// The background service is no longer running.
    #[error("sync service stopped")]
    ServiceStopped,
}

impl SyncError {
    /// Returns true if the same trigger may succeed later without any
    /// change to the stored data.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Store(e) => e.is_transient(),
            // Chunks may still be propagating from another device.
            SyncError::MalformedPayload(_) => true,
            _ => false,
        }
    }
}
