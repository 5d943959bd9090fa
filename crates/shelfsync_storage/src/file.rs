//! File-backed store for persistent profiles.

use crate::error::{StoreError, StoreResult};
use crate::feed::ChangeFeed;
use crate::memory::{apply_remove, apply_set};
use crate::store::{ChangeSet, Entries, KvStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

/// A key-value store persisted as a single JSON object on disk.
///
/// # Durability
///
/// Every mutation rewrites the whole document to a sibling temporary file
/// and renames it over the original, so a crash leaves either the old or the
/// new document, never a torn one.
///
/// Writers are serialized by an async lock and the file itself is written on
/// the blocking thread pool, so no runtime worker waits on disk I/O. Readers
/// see the previous document until the new one is on disk.
///
/// # Example
///
/// ```no_run
/// use shelfsync_storage::FileStore;
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("profile/local.json")).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<Entries>,
    writer: Mutex<()>,
    feed: ChangeFeed,
    item_quota: Option<usize>,
}

impl FileStore {
    /// Opens the store at `path`, creating parent directories if needed.
    ///
    /// A missing file is treated as an empty store and is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a JSON object, or if
    /// it cannot be read.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = if path.exists() {
            let text = fs::read_to_string(path)?;
            if text.trim().is_empty() {
                Entries::new()
            } else {
                match serde_json::from_str::<Value>(&text)? {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => {
                        return Err(StoreError::Corrupted(format!(
                            "{} does not contain a JSON object",
                            path.display()
                        )))
                    }
                }
            }
        } else {
            Entries::new()
        };

        tracing::debug!(path = %path.display(), keys = data.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
            writer: Mutex::new(()),
            feed: ChangeFeed::new(),
            item_quota: None,
        })
    }

    /// Sets a per-item byte quota for subsequent writes.
    #[must_use]
    pub fn with_item_quota(mut self, limit: usize) -> Self {
        self.item_quota = Some(limit);
        self
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn snapshot(&self) -> Entries {
        self.data.read().clone()
    }

    async fn persist(&self, data: &Entries) -> StoreResult<()> {
        let object: serde_json::Map<String, Value> =
            data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let text = serde_json::to_string_pretty(&Value::Object(object))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &text))
            .await
            .map_err(|e| StoreError::Unavailable(format!("persist task failed: {e}")))?
    }

    async fn commit(&self, staged: Entries, change: ChangeSet) -> StoreResult<()> {
        if change.is_empty() {
            return Ok(());
        }
        self.persist(&staged).await?;
        *self.data.write() = staged;
        self.feed.emit(change);
        Ok(())
    }
}

fn write_atomically(path: &Path, text: &str) -> StoreResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl KvStore for FileStore {
    async fn get_many(&self, keys: &[String]) -> StoreResult<Entries> {
        let data = self.data.read();
        Ok(keys
            .iter()
            .filter_map(|k| data.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn set_many(&self, entries: Entries) -> StoreResult<()> {
        let _writing = self.writer.lock().await;
        let mut staged = self.snapshot();
        let change = apply_set(&mut staged, entries, self.item_quota)?;
        self.commit(staged, change).await
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<()> {
        let _writing = self.writer.lock().await;
        let mut staged = self.snapshot();
        let change = apply_remove(&mut staged, keys);
        self.commit(staged, change).await
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeSet> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("local.json")).unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("prompts", json!([{"id": "a"}])).await.unwrap();
            store.set("syncEnabled", json!(false)).await.unwrap();
            store.remove("syncEnabled").await.unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get("prompts").await.unwrap(),
            Some(json!([{"id": "a"}]))
        );
        assert_eq!(store.get("syncEnabled").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_object_file_is_corrupted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[tokio::test]
    async fn quota_violation_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remote.json");
        let store = FileStore::open(&path).unwrap().with_item_quota(20);

        store.set("k", json!("short")).await.unwrap();
        let err = store.set("k", json!("x".repeat(64))).await.unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.unwrap(), Some(json!("short")));
    }

    #[tokio::test]
    async fn writes_notify_subscribers() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("local.json")).unwrap();
        let mut rx = store.subscribe();

        store.set("prompts", json!([])).await.unwrap();
        let change = rx.try_recv().unwrap();
        assert!(change.get("prompts").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_writes_all_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remote.json");
        let store = std::sync::Arc::new(FileStore::open(&path).unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.set(&format!("k{i}"), json!(i)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.snapshot().len(), 16);
        let reopened = FileStore::open(&path).unwrap();
        for i in 0..16 {
            assert_eq!(reopened.get(&format!("k{i}")).await.unwrap(), Some(json!(i)));
        }
    }
}
