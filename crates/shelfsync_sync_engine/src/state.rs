//! Outcomes, statistics and notifications.

use std::time::Instant;

/// Why a propagation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sync is disabled.
    Disabled,
    /// The payload matches the last one written or applied.
    Echo,
    /// Bootstrap found data already on the remote side.
    RemoteHasData,
    /// Bootstrap found an empty local collection.
    NothingToPush,
}

/// Result of an outbound propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The index and chunks were written.
    Pushed {
        /// Number of chunks written.
        chunk_count: usize,
        /// Fingerprint of the written payload.
        fingerprint: String,
        /// Stale chunks removed from a previous, larger write.
        removed_stale: usize,
    },
    /// Nothing was written.
    Skipped(SkipReason),
}

/// Result of an inbound propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The merged collection was written locally.
    Applied {
        /// Size of the merged collection.
        records: usize,
        /// Identities that came only from the remote side.
        added: usize,
        /// Identities where the remote copy was newer.
        replaced: usize,
    },
    /// The merge produced exactly the current local collection.
    Unchanged,
    /// The remote index is absent or declares no chunks.
    NoRemoteData,
    /// Nothing was read or applied.
    Skipped(SkipReason),
}

/// Broadcast to UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfEvent {
    /// The canonical collection changed; re-read and redisplay.
    CollectionChanged {
        /// Size of the new collection.
        records: usize,
    },
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Successful outbound writes.
    pub pushes: u64,
    /// Inbound merges that changed the local collection.
    pub pulls_applied: u64,
    /// Inbound merges that changed nothing.
    pub pulls_unchanged: u64,
    /// Propagations skipped because of the ledger or the echo guard.
    pub echoes_suppressed: u64,
    /// Propagations abandoned on error.
    pub failures: u64,
    /// Time of the last successful push or apply.
    pub last_sync_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}
