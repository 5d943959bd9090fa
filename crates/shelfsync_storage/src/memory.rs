//! In-memory store for tests and simulated replicas.

use crate::error::{StoreError, StoreResult};
use crate::feed::ChangeFeed;
use crate::store::{item_size, ChangeSet, Entries, KvStore, StorageChange};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc::UnboundedReceiver;

/// An in-memory key-value store.
///
/// Suitable for:
/// - Unit and integration tests
/// - Simulating a replicated remote store shared by several engines
///
/// An optional per-item quota mirrors the byte ceiling of browser-style sync
/// storage. Writes can be made to fail on demand to exercise failure paths.
///
/// # Thread Safety
///
/// The store is thread-safe; changes are emitted while the data lock is
/// held, so subscribers observe them in application order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Entries>,
    feed: ChangeFeed,
    item_quota: Option<usize>,
    failing_writes: AtomicUsize,
    write_count: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty store without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects items larger than `limit` bytes.
    #[must_use]
    pub fn with_item_quota(limit: usize) -> Self {
        Self {
            item_quota: Some(limit),
            ..Self::default()
        }
    }

    /// Creates a store with pre-existing entries.
    ///
    /// Useful for seeding device state in tests.
    #[must_use]
    pub fn with_entries(entries: Entries) -> Self {
        Self {
            data: RwLock::new(entries),
            ..Self::default()
        }
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn snapshot(&self) -> Entries {
        self.data.read().clone()
    }

    /// Returns all keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Makes the next `count` mutations fail with [`StoreError::Unavailable`].
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Returns the number of successful mutations.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get_many(&self, keys: &[String]) -> StoreResult<Entries> {
        let data = self.data.read();
        Ok(keys
            .iter()
            .filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn set_many(&self, entries: Entries) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut data = self.data.write();
        let change = apply_set(&mut data, entries, self.item_quota)?;
        if !change.is_empty() {
            self.write_count.fetch_add(1, Ordering::SeqCst);
        }
        self.feed.emit(change);
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<()> {
        self.check_injected_failure()?;
        let mut data = self.data.write();
        let change = apply_remove(&mut data, keys);
        if !change.is_empty() {
            self.write_count.fetch_add(1, Ordering::SeqCst);
        }
        self.feed.emit(change);
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeSet> {
        self.feed.subscribe()
    }
}

/// Validates every entry against `quota`, then writes them all.
pub(crate) fn apply_set(
    data: &mut Entries,
    entries: Entries,
    quota: Option<usize>,
) -> StoreResult<ChangeSet> {
    if let Some(limit) = quota {
        for (key, value) in &entries {
            let size = item_size(key, value);
            if size > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.clone(),
                    size,
                    limit,
                });
            }
        }
    }

    let mut change = ChangeSet::default();
    for (key, value) in entries {
        let old_value = data.insert(key.clone(), value.clone());
        if old_value.as_ref() == Some(&value) {
            continue;
        }
        change.changes.insert(
            key,
            StorageChange {
                old_value,
                new_value: Some(value),
            },
        );
    }
    Ok(change)
}

/// Removes `keys`, reporting only those that were present.
pub(crate) fn apply_remove(data: &mut Entries, keys: &[String]) -> ChangeSet {
    let mut change = ChangeSet::default();
    for key in keys {
        if let Some(old_value) = data.remove(key) {
            change.changes.insert(
                key.clone(),
                StorageChange {
                    old_value: Some(old_value),
                    new_value: None,
                },
            );
        }
    }
    change
}
