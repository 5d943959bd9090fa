//! Remote index descriptor and key layout.

use serde::{Deserialize, Serialize};

/// Current index format version.
pub const INDEX_VERSION: u32 = 1;

/// Describes the chunked payload currently stored on the remote side.
///
/// Readers start from the index: it names how many chunk keys to read and
/// the fingerprint of the payload they should reassemble to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIndex {
    /// Format version.
    #[serde(rename = "v", default)]
    pub version: u32,
    /// Number of chunks, stored under chunk keys `0..chunk_count`.
    #[serde(rename = "n", default)]
    pub chunk_count: usize,
    /// Fingerprint of the full payload.
    #[serde(rename = "hash", default)]
    pub fingerprint: String,
    /// Milliseconds since the Unix epoch of the write.
    #[serde(rename = "ts", default)]
    pub written_at: i64,
}

impl SyncIndex {
    /// Creates an index for a freshly written payload.
    pub fn new(chunk_count: usize, fingerprint: impl Into<String>, written_at: i64) -> Self {
        Self {
            version: INDEX_VERSION,
            chunk_count,
            fingerprint: fingerprint.into(),
            written_at,
        }
    }

    /// Parses a stored index. Anything that is not an index object reads as
    /// `None`, the same as an absent index.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Converts to a storable value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "v": self.version,
            "n": self.chunk_count,
            "hash": self.fingerprint,
            "ts": self.written_at,
        })
    }

    /// Returns true if the index declares at least one chunk.
    pub fn has_data(&self) -> bool {
        self.chunk_count > 0
    }
}

/// Deterministic remote key names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Key holding the [`SyncIndex`].
    pub index_key: String,
    /// Prefix of chunk keys; chunk `i` lives at `{prefix}{i}`.
    pub chunk_prefix: String,
}

impl ChunkLayout {
    /// Creates a layout with custom key names.
    pub fn new(index_key: impl Into<String>, chunk_prefix: impl Into<String>) -> Self {
        Self {
            index_key: index_key.into(),
            chunk_prefix: chunk_prefix.into(),
        }
    }

    /// Key of chunk `i`.
    pub fn chunk_key(&self, i: usize) -> String {
        format!("{}{}", self.chunk_prefix, i)
    }

    /// Keys of chunks in `range`, in index order.
    pub fn chunk_keys(&self, range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| self.chunk_key(i)).collect()
    }

    /// Returns true if `key` is the index key or a chunk key.
    pub fn is_sync_key(&self, key: &str) -> bool {
        key == self.index_key || key.starts_with(&self.chunk_prefix)
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self::new("psync_index", "psync_ch_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn index_wire_format() {
        let index = SyncIndex::new(3, "abc", 99);
        assert_eq!(
            index.to_value(),
            json!({"v": 1, "n": 3, "hash": "abc", "ts": 99})
        );
        assert_eq!(SyncIndex::from_value(&index.to_value()), Some(index));
    }

    #[test]
    fn malformed_index_reads_as_absent() {
        assert_eq!(SyncIndex::from_value(&json!("garbage")), None);
        assert_eq!(SyncIndex::from_value(&json!({"n": "three"})), None);
    }

    #[test]
    fn partial_index_defaults() {
        let index = SyncIndex::from_value(&json!({"n": 2})).unwrap();
        assert_eq!(index.chunk_count, 2);
        assert_eq!(index.fingerprint, "");
        assert!(index.has_data());
        assert!(!SyncIndex::from_value(&json!({})).unwrap().has_data());
    }

    #[test]
    fn default_layout_keys() {
        let layout = ChunkLayout::default();
        assert_eq!(layout.chunk_key(0), "psync_ch_0");
        assert_eq!(
            layout.chunk_keys(1..3),
            vec!["psync_ch_1".to_string(), "psync_ch_2".to_string()]
        );
        assert!(layout.is_sync_key("psync_index"));
        assert!(layout.is_sync_key("psync_ch_12"));
        assert!(!layout.is_sync_key("prompts"));
    }
}
