//! Key-value store contract.

use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedReceiver;

/// Key/value pairs read from or written to a store.
pub type Entries = BTreeMap<String, Value>;

/// The old and new value of one key within a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    /// Value before the write. `None` if the key was absent.
    pub old_value: Option<Value>,
    /// Value after the write. `None` if the key was removed.
    pub new_value: Option<Value>,
}

/// All keys touched by one logical write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Changed keys with their old and new values.
    pub changes: BTreeMap<String, StorageChange>,
}

impl ChangeSet {
    /// Returns true if no key changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the changed keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Returns the change for `key`, if it was touched.
    pub fn get(&self, key: &str) -> Option<&StorageChange> {
        self.changes.get(key)
    }
}

/// A persistent or replicated map from string keys to JSON values.
///
/// # Invariants
///
/// - `set_many` applies every entry or none of them
/// - Each successful mutation that changes at least one key emits exactly
///   one [`ChangeSet`] to every live subscriber, in mutation order
/// - Removing absent keys is a no-op and emits nothing
///
/// Stores give no isolation across separate calls: a reader may observe one
/// batch before another written earlier by a different device.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the given keys. Absent keys are omitted from the result.
    async fn get_many(&self, keys: &[String]) -> StoreResult<Entries>;

    /// Writes all entries as one logical change.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is rejected (for example by a quota)
    /// or the store cannot be written. Nothing is written in that case.
    async fn set_many(&self, entries: Entries) -> StoreResult<()>;

    /// Removes the given keys as one logical change.
    async fn remove_many(&self, keys: &[String]) -> StoreResult<()>;

    /// Subscribes to future changes.
    fn subscribe(&self) -> UnboundedReceiver<ChangeSet>;

    /// Reads a single key.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let mut entries = self.get_many(&[key.to_string()]).await?;
        Ok(entries.remove(key))
    }

    /// Writes a single key.
    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut entries = Entries::new();
        entries.insert(key.to_string(), value);
        self.set_many(entries).await
    }

    /// Removes a single key.
    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.remove_many(&[key.to_string()]).await
    }
}

/// Size of one stored item as counted against a per-item quota: the key's
/// byte length plus the byte length of the JSON-serialized value.
pub fn item_size(key: &str, value: &Value) -> usize {
    key.len() + value.to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_size_counts_json_quoting() {
        // "abc" serializes with surrounding quotes
        assert_eq!(item_size("k", &json!("abc")), 1 + 5);
        assert_eq!(item_size("key", &json!(true)), 3 + 4);
    }

    #[test]
    fn item_size_counts_utf8_bytes() {
        assert_eq!(item_size("", &json!("é")), 2 + 2);
    }

    #[test]
    fn change_set_accessors() {
        let mut set = ChangeSet::default();
        assert!(set.is_empty());
        set.changes.insert(
            "b".into(),
            StorageChange {
                old_value: None,
                new_value: Some(json!(1)),
            },
        );
        set.changes.insert(
            "a".into(),
            StorageChange {
                old_value: Some(json!(0)),
                new_value: None,
            },
        );
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set.get("a").unwrap().new_value, None);
    }
}
