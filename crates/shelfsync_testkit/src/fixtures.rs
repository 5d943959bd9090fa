//! Test fixtures and store helpers.

use serde_json::Value;
use shelfsync_codec::{Category, Record};
use shelfsync_storage::InMemoryStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Shorthand for a record with only id, text and timestamp set.
pub fn rec(id: &str, text: &str, updated_at: i64) -> Record {
    Record::with_id(id, "", text, updated_at)
}

/// A record in the given category.
pub fn rec_in(id: &str, text: &str, category: Category, updated_at: i64) -> Record {
    Record {
        category,
        ..rec(id, text, updated_at)
    }
}

/// Collection JSON as stored under the local collection key.
pub fn collection_value(records: &[Record]) -> Value {
    serde_json::to_value(records).expect("records serialize")
}

/// Returns true if both collections hold the same records, ignoring order.
pub fn same_records(a: &[Record], b: &[Record]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let by_id: HashMap<&str, &Record> = a.iter().map(|r| (r.id.as_str(), r)).collect();
    by_id.len() == a.len() && b.iter().all(|r| by_id.get(r.id.as_str()) == Some(&r))
}

/// Returns true if `records` is sorted by `updated_at`, newest first.
pub fn is_newest_first(records: &[Record]) -> bool {
    records
        .windows(2)
        .all(|w| w[0].updated_at >= w[1].updated_at)
}

/// Two devices' local stores sharing one remote store.
pub struct DevicePair {
    /// First device's local store.
    pub local_a: Arc<InMemoryStore>,
    /// Second device's local store.
    pub local_b: Arc<InMemoryStore>,
    /// The shared remote store.
    pub remote: Arc<InMemoryStore>,
}

impl DevicePair {
    /// Creates empty stores; the remote enforces `item_quota` bytes.
    pub fn with_item_quota(item_quota: usize) -> Self {
        Self {
            local_a: Arc::new(InMemoryStore::new()),
            local_b: Arc::new(InMemoryStore::new()),
            remote: Arc::new(InMemoryStore::with_item_quota(item_quota)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_records_ignores_order() {
        let a = vec![rec("a", "x", 1), rec("b", "y", 2)];
        let b = vec![rec("b", "y", 2), rec("a", "x", 1)];
        assert!(same_records(&a, &b));
        assert!(!same_records(&a, &[rec("a", "x", 1), rec("b", "z", 2)]));
        assert!(!same_records(&a, &a[..1]));
    }

    #[test]
    fn newest_first() {
        assert!(is_newest_first(&[rec("a", "", 3), rec("b", "", 3), rec("c", "", 1)]));
        assert!(!is_newest_first(&[rec("a", "", 1), rec("b", "", 2)]));
    }
}
