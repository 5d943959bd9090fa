//! Configuration for the sync engine.

use shelfsync_codec::{ChunkLayout, DEFAULT_MAX_CHUNK_BYTES};
use std::time::Duration;

/// Per-item byte ceiling of the remote store, including key and overhead.
pub const REMOTE_ITEM_QUOTA: usize = 8192;

/// Maximum number of items the remote store holds.
pub const REMOTE_MAX_ITEMS: usize = 512;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote index and chunk key names.
    pub layout: ChunkLayout,
    /// Local key holding the collection.
    pub collection_key: String,
    /// Local key holding the enabled flag.
    pub enabled_key: String,
    /// Maximum payload bytes per chunk.
    pub max_chunk_bytes: usize,
    /// Largest chunk count a remote index may declare. Indexes above it
    /// are treated as corrupt.
    pub max_chunks: usize,
    /// Quiet period after the last local change before pushing.
    pub outbound_debounce: Duration,
    /// Quiet period after the last remote change before pulling.
    pub inbound_debounce: Duration,
    /// Capacity of the service inbox and the change broadcast.
    pub event_capacity: usize,
}

impl SyncConfig {
    /// Creates a configuration with the standard key names and timings.
    pub fn new() -> Self {
        Self {
            layout: ChunkLayout::default(),
            collection_key: "prompts".into(),
            enabled_key: "syncEnabled".into(),
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
            max_chunks: REMOTE_MAX_ITEMS - 1,
            outbound_debounce: Duration::from_millis(600),
            inbound_debounce: Duration::from_millis(400),
            event_capacity: 64,
        }
    }

    /// Sets the remote key layout.
    pub fn with_layout(mut self, layout: ChunkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the local collection key.
    pub fn with_collection_key(mut self, key: impl Into<String>) -> Self {
        self.collection_key = key.into();
        self
    }

    /// Sets the maximum payload bytes per chunk.
    pub fn with_max_chunk_bytes(mut self, bytes: usize) -> Self {
        self.max_chunk_bytes = bytes;
        self
    }

    /// Sets the largest chunk count accepted from a remote index.
    pub fn with_max_chunks(mut self, chunks: usize) -> Self {
        self.max_chunks = chunks;
        self
    }

    /// Sets both debounce windows.
    pub fn with_debounce(mut self, outbound: Duration, inbound: Duration) -> Self {
        self.outbound_debounce = outbound;
        self.inbound_debounce = inbound;
        self
    }

    /// Sets the event channel capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
