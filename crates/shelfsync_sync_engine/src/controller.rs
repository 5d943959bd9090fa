//! Sync controller.
//!
//! Orchestrates the codec, ledger and reconciler against the local and
//! remote stores. Every public propagation re-reads the stores it needs, so
//! callers never pass diffs around.

use crate::config::SyncConfig;
use crate::echo::EchoGuard;
use crate::error::{SyncError, SyncResult};
use crate::ledger::ChangeLedger;
use crate::reconcile::merge_with_report;
use crate::settings;
use crate::state::{PullOutcome, PushOutcome, ShelfEvent, SkipReason, SyncStats};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shelfsync_codec::{
    decode_payload, encode_payload, fingerprint, join_chunks, now_millis, split_chunks, Record,
    SyncIndex,
};
use shelfsync_storage::{ChangeSet, Entries, KvStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Moves a record collection between a local and a remote store.
///
/// # Concurrency
///
/// Inbound applies are serialized by an async mutex, as are outbound
/// writes, so at most one of each is ever in flight even when several tasks
/// share the controller. The ledger, echo guard and statistics sit behind
/// short synchronous locks that are never held across an await point.
pub struct SyncController<L: ?Sized, R: ?Sized> {
    config: SyncConfig,
    local: Arc<L>,
    remote: Arc<R>,
    ledger: Mutex<ChangeLedger>,
    echo: Mutex<EchoGuard>,
    enabled: AtomicBool,
    apply_lock: tokio::sync::Mutex<()>,
    write_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<ShelfEvent>,
    stats: RwLock<SyncStats>,
}

impl<L, R> SyncController<L, R>
where
    L: KvStore + ?Sized,
    R: KvStore + ?Sized,
{
    /// Creates a controller. Sync starts enabled until
    /// [`load_settings`](Self::load_settings) reads the persisted flag.
    pub fn new(config: SyncConfig, local: Arc<L>, remote: Arc<R>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            local,
            remote,
            ledger: Mutex::new(ChangeLedger::new()),
            echo: Mutex::new(EchoGuard::new()),
            enabled: AtomicBool::new(true),
            apply_lock: tokio::sync::Mutex::new(()),
            write_lock: tokio::sync::Mutex::new(()),
            events,
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the local store.
    pub fn local(&self) -> &Arc<L> {
        &self.local
    }

    /// Gets the remote store.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Gets a snapshot of the ledger.
    pub fn ledger(&self) -> ChangeLedger {
        self.ledger.lock().clone()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Subscribes to collection-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ShelfEvent> {
        self.events.subscribe()
    }

    /// Returns true if sync is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Writes the default flag if absent, then loads the persisted flag.
    pub async fn load_settings(&self) -> SyncResult<bool> {
        let key = &self.config.enabled_key;
        settings::ensure_default_enabled(self.local.as_ref(), key).await?;
        let enabled = settings::read_enabled(self.local.as_ref(), key).await;
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(enabled)
    }

    /// Enables or disables sync and persists the choice.
    ///
    /// Disabling stops both directions but keeps the ledger and leaves
    /// remote data in place.
    pub async fn set_enabled(&self, enabled: bool) -> SyncResult<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        settings::write_enabled(self.local.as_ref(), &self.config.enabled_key, enabled).await?;
        tracing::info!(enabled, "sync toggled");
        Ok(())
    }

    /// Reads the local collection. An absent key is an empty collection.
    pub async fn read_local(&self) -> SyncResult<Vec<Record>> {
        let key = &self.config.collection_key;
        match self.local.get(key).await? {
            Some(value) => self.parse_collection(value),
            None => Ok(Vec::new()),
        }
    }

    /// Reads the remote index, treating a malformed one as absent.
    pub async fn read_index(&self) -> SyncResult<Option<SyncIndex>> {
        let value = self.remote.get(&self.config.layout.index_key).await?;
        Ok(value.as_ref().and_then(SyncIndex::from_value))
    }

    /// Runs the startup sequence: load the flag, pull, then bootstrap.
    ///
    /// Failures are logged and do not stop later steps.
    pub async fn start(&self) {
        if let Err(e) = self.load_settings().await {
            tracing::warn!(error = %e, "failed to load sync settings");
        }
        if let Err(e) = self.pull_remote().await {
            tracing::warn!(error = %e, "startup pull abandoned");
        }
        if let Err(e) = self.bootstrap().await {
            tracing::warn!(error = %e, "bootstrap push abandoned");
        }
    }

    /// Pulls, then pushes the current local collection.
    pub async fn sync_now(&self) -> SyncResult<(PullOutcome, PushOutcome)> {
        let pulled = self.pull_remote().await?;
        let pushed = self.push_current().await?;
        Ok((pulled, pushed))
    }

    /// Seeds an empty remote side with the local collection.
    ///
    /// Runs only when the remote index is absent or declares no chunks and
    /// the local collection is non-empty. The write bypasses the ledger.
    pub async fn bootstrap(&self) -> SyncResult<PushOutcome> {
        if !self.is_enabled() {
            return Ok(PushOutcome::Skipped(SkipReason::Disabled));
        }
        let result = self.bootstrap_inner().await;
        self.track(result)
    }

    async fn bootstrap_inner(&self) -> SyncResult<PushOutcome> {
        if self.read_index().await?.is_some_and(|index| index.has_data()) {
            return Ok(PushOutcome::Skipped(SkipReason::RemoteHasData));
        }
        let records = self.read_local().await?;
        if records.is_empty() {
            return Ok(PushOutcome::Skipped(SkipReason::NothingToPush));
        }
        tracing::info!(records = records.len(), "bootstrapping empty remote");
        self.write_out(&records, true).await
    }

    /// Pushes the current local collection.
    pub async fn push_current(&self) -> SyncResult<PushOutcome> {
        if !self.is_enabled() {
            return Ok(PushOutcome::Skipped(SkipReason::Disabled));
        }
        let result = match self.read_local().await {
            Ok(records) => self.write_out(&records, false).await,
            Err(e) => Err(e),
        };
        self.track(result)
    }

    /// Pushes `records` unless the ledger marks the payload as an echo.
    pub async fn push_local(&self, records: &[Record]) -> SyncResult<PushOutcome> {
        if !self.is_enabled() {
            return Ok(PushOutcome::Skipped(SkipReason::Disabled));
        }
        let result = self.write_out(records, false).await;
        self.track(result)
    }

    /// Encodes, chunks and writes `records`, then trims stale chunks.
    async fn write_out(&self, records: &[Record], force: bool) -> SyncResult<PushOutcome> {
        let _writing = self.write_lock.lock().await;

        let written_at = now_millis();
        let payload = encode_payload(records, written_at)?;
        let hash = fingerprint(&payload);

        if !force && !self.ledger.lock().should_propagate_out(&hash) {
            tracing::debug!(fingerprint = %hash, "skipping push of known payload");
            self.stats.write().echoes_suppressed += 1;
            return Ok(PushOutcome::Skipped(SkipReason::Echo));
        }

        let chunks = split_chunks(&payload, self.config.max_chunk_bytes)?;
        let chunk_count = chunks.len();
        let layout = &self.config.layout;

        let previous = match self.read_index().await? {
            Some(index) if index.chunk_count > self.config.max_chunks => {
                tracing::warn!(
                    declared = index.chunk_count,
                    limit = self.config.max_chunks,
                    "previous index declares too many chunks, trimming up to the limit"
                );
                self.config.max_chunks
            }
            Some(index) => index.chunk_count,
            None => 0,
        };

        let mut entries = Entries::new();
        entries.insert(
            layout.index_key.clone(),
            SyncIndex::new(chunk_count, hash.clone(), written_at).to_value(),
        );
        for (i, chunk) in chunks.into_iter().enumerate() {
            entries.insert(layout.chunk_key(i), Value::String(chunk));
        }
        self.remote.set_many(entries).await?;

        let mut removed_stale = 0;
        if previous > chunk_count {
            let stale = layout.chunk_keys(chunk_count..previous);
            removed_stale = stale.len();
            self.remote.remove_many(&stale).await?;
        }

        self.ledger.lock().record_written(hash.clone());
        {
            let mut stats = self.stats.write();
            stats.pushes += 1;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }
        tracing::info!(
            records = records.len(),
            chunks = chunk_count,
            removed_stale,
            fingerprint = %hash,
            "pushed collection"
        );

        Ok(PushOutcome::Pushed {
            chunk_count,
            fingerprint: hash,
            removed_stale,
        })
    }

    /// Reads the remote payload, merges it into the local collection and
    /// writes the result if it differs.
    ///
    /// Missing chunks are read as empty; a payload that then fails to parse
    /// is rejected whole and local data stays untouched.
    pub async fn pull_remote(&self) -> SyncResult<PullOutcome> {
        if !self.is_enabled() {
            return Ok(PullOutcome::Skipped(SkipReason::Disabled));
        }
        let _applying = self.apply_lock.lock().await;
        let result = self.pull_inner().await;
        self.track(result)
    }

    async fn pull_inner(&self) -> SyncResult<PullOutcome> {
        let index = match self.read_index().await? {
            Some(index) if index.has_data() => index,
            _ => return Ok(PullOutcome::NoRemoteData),
        };
        if index.chunk_count > self.config.max_chunks {
            return Err(SyncError::MalformedPayload(format!(
                "index declares {} chunks, limit is {}",
                index.chunk_count, self.config.max_chunks
            )));
        }

        let keys = self.config.layout.chunk_keys(0..index.chunk_count);
        let chunks = self.remote.get_many(&keys).await?;
        let payload = join_chunks(keys.iter().map(|k| chunks.get(k).and_then(Value::as_str)));
        let hash = fingerprint(&payload);

        if !self.ledger.lock().should_propagate_in(&hash) {
            tracing::debug!(fingerprint = %hash, "skipping pull of known payload");
            self.stats.write().echoes_suppressed += 1;
            return Ok(PullOutcome::Skipped(SkipReason::Echo));
        }
        if !index.fingerprint.is_empty() && index.fingerprint != hash {
            tracing::debug!(
                expected = %index.fingerprint,
                actual = %hash,
                "index and chunks disagree, remote write may be in progress"
            );
        }

        let remote = decode_payload(&payload)
            .map_err(|e| SyncError::MalformedPayload(e.to_string()))?
            .prompts;
        let local = self.read_local().await?;
        let report = merge_with_report(&local, &remote);

        if report.records == local {
            self.ledger.lock().record_applied(hash);
            self.stats.write().pulls_unchanged += 1;
            tracing::debug!(records = local.len(), "remote merge changed nothing");
            return Ok(PullOutcome::Unchanged);
        }

        let value = serde_json::to_value(&report.records).map_err(|e| {
            SyncError::MalformedCollection {
                key: self.config.collection_key.clone(),
                message: e.to_string(),
            }
        })?;

        self.echo.lock().arm(report.records.clone());
        if let Err(e) = self.local.set(&self.config.collection_key, value).await {
            self.echo.lock().disarm();
            return Err(e.into());
        }

        self.ledger.lock().record_applied(hash);
        {
            let mut stats = self.stats.write();
            stats.pulls_applied += 1;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }
        tracing::info!(
            records = report.records.len(),
            added = report.added_from_remote,
            replaced = report.replaced_by_remote,
            "applied remote collection"
        );

        // No receivers is fine: nobody is displaying the collection.
        let _ = self.events.send(ShelfEvent::CollectionChanged {
            records: report.records.len(),
        });

        Ok(PullOutcome::Applied {
            records: report.records.len(),
            added: report.added_from_remote,
            replaced: report.replaced_by_remote,
        })
    }

    /// Classifies a local-store change.
    ///
    /// Returns true if it touches the collection and is not the echo of
    /// this controller's own inbound apply.
    pub fn accept_local_change(&self, change: &ChangeSet) -> bool {
        let Some(entry) = change.get(&self.config.collection_key) else {
            return false;
        };
        let records = match entry.new_value.clone() {
            Some(value) => match self.parse_collection(value) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable local change");
                    self.echo.lock().disarm();
                    return false;
                }
            },
            None => Vec::new(),
        };

        if self.echo.lock().take_if_echo(&records) {
            tracing::debug!("dropping local echo of inbound apply");
            self.stats.write().echoes_suppressed += 1;
            return false;
        }
        true
    }

    /// Returns true if any of `keys` is the remote index or a chunk.
    pub fn is_sync_change<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .any(|key| self.config.layout.is_sync_key(key))
    }

    fn parse_collection(&self, value: Value) -> SyncResult<Vec<Record>> {
        serde_json::from_value(value).map_err(|e| SyncError::MalformedCollection {
            key: self.config.collection_key.clone(),
            message: e.to_string(),
        })
    }

    fn track<T>(&self, result: SyncResult<T>) -> SyncResult<T> {
        if let Err(e) = &result {
            let mut stats = self.stats.write();
            stats.failures += 1;
            stats.last_error = Some(e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelfsync_codec::ChunkLayout;
    use shelfsync_storage::InMemoryStore;

    type Controller = SyncController<InMemoryStore, InMemoryStore>;

    fn controller_with(config: SyncConfig) -> Controller {
        SyncController::new(
            config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
        )
    }

    fn controller() -> Controller {
        controller_with(SyncConfig::default())
    }

    fn rec(id: &str, text: &str, updated_at: i64) -> Record {
        Record::with_id(id, "", text, updated_at)
    }

    async fn set_local(controller: &Controller, records: &[Record]) {
        controller
            .local()
            .set("prompts", serde_json::to_value(records).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn push_writes_index_and_chunks() {
        let c = controller();
        let outcome = c.push_local(&[rec("a", "hello", 100)]).await.unwrap();

        let PushOutcome::Pushed {
            chunk_count,
            fingerprint: hash,
            ..
        } = outcome
        else {
            panic!("expected push");
        };
        assert_eq!(chunk_count, 1);

        let index = c.read_index().await.unwrap().unwrap();
        assert_eq!(index.chunk_count, 1);
        assert_eq!(index.fingerprint, hash);
        assert_eq!(c.ledger().last_written(), Some(hash.as_str()));

        let chunk = c.remote().get("psync_ch_0").await.unwrap().unwrap();
        let payload = decode_payload(chunk.as_str().unwrap()).unwrap();
        assert_eq!(payload.prompts, vec![rec("a", "hello", 100)]);
    }

    #[tokio::test]
    async fn pull_without_index_reports_no_data() {
        let c = controller();
        assert_eq!(c.pull_remote().await.unwrap(), PullOutcome::NoRemoteData);

        c.remote()
            .set("psync_index", json!({"v": 1, "n": 0, "hash": "", "ts": 0}))
            .await
            .unwrap();
        assert_eq!(c.pull_remote().await.unwrap(), PullOutcome::NoRemoteData);
    }

    #[tokio::test]
    async fn pull_of_own_write_is_echo() {
        let c = controller();
        c.push_local(&[rec("a", "x", 1)]).await.unwrap();
        assert_eq!(
            c.pull_remote().await.unwrap(),
            PullOutcome::Skipped(SkipReason::Echo)
        );
        assert_eq!(c.stats().echoes_suppressed, 1);
    }

    #[tokio::test]
    async fn pull_merges_and_notifies() {
        let writer = controller();
        writer.push_local(&[rec("a", "remote", 200)]).await.unwrap();

        let reader = SyncController::new(
            SyncConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::clone(writer.remote()),
        );
        set_local(&reader, &[rec("a", "local", 100), rec("b", "mine", 50)]).await;
        let mut events = reader.subscribe();

        let outcome = reader.pull_remote().await.unwrap();
        assert_eq!(
            outcome,
            PullOutcome::Applied {
                records: 2,
                added: 0,
                replaced: 1,
            }
        );
        assert_eq!(
            reader.read_local().await.unwrap(),
            vec![rec("a", "remote", 200), rec("b", "mine", 50)]
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ShelfEvent::CollectionChanged { records: 2 }
        );
    }

    #[tokio::test]
    async fn unchanged_merge_skips_local_write() {
        let writer = controller();
        writer.push_local(&[rec("a", "same", 100)]).await.unwrap();

        let local = Arc::new(InMemoryStore::new());
        let reader = SyncController::new(
            SyncConfig::default(),
            Arc::clone(&local),
            Arc::clone(writer.remote()),
        );
        set_local(&reader, &[rec("a", "same", 100)]).await;
        let writes_before = local.write_count();

        assert_eq!(reader.pull_remote().await.unwrap(), PullOutcome::Unchanged);
        assert_eq!(local.write_count(), writes_before);
        assert!(reader.ledger().last_applied().is_some());
    }

    #[tokio::test]
    async fn malformed_payload_leaves_local_untouched() {
        let c = controller();
        set_local(&c, &[rec("a", "keep", 1)]).await;

        let mut entries = Entries::new();
        entries.insert("psync_index".into(), SyncIndex::new(2, "x", 1).to_value());
        entries.insert("psync_ch_0".into(), json!("{\"prompts\":[{\"id\":"));
        c.remote().set_many(entries).await.unwrap();

        let err = c.pull_remote().await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
        assert_eq!(c.read_local().await.unwrap(), vec![rec("a", "keep", 1)]);
        assert_eq!(c.stats().failures, 1);
        assert!(c.stats().last_error.is_some());
    }

    fn corrupt_index() -> Value {
        json!({"v": 1, "n": 1_000_000_000_000_000_000u64, "hash": "x", "ts": 1})
    }

    #[tokio::test]
    async fn oversized_chunk_count_is_rejected() {
        let c = controller();
        set_local(&c, &[rec("a", "keep", 1)]).await;
        c.remote().set("psync_index", corrupt_index()).await.unwrap();

        let err = c.pull_remote().await.unwrap_err();
        assert!(matches!(err, SyncError::MalformedPayload(_)));
        assert_eq!(c.read_local().await.unwrap(), vec![rec("a", "keep", 1)]);
        assert_eq!(c.stats().failures, 1);
    }

    #[tokio::test]
    async fn push_over_oversized_index_trims_up_to_limit() {
        let c = controller_with(SyncConfig::default().with_max_chunks(8));
        let mut entries = Entries::new();
        entries.insert("psync_index".into(), corrupt_index());
        entries.insert("psync_ch_5".into(), json!("stale"));
        c.remote().set_many(entries).await.unwrap();

        let outcome = c.push_local(&[rec("a", "fresh", 1)]).await.unwrap();
        assert!(matches!(
            outcome,
            PushOutcome::Pushed {
                chunk_count: 1,
                removed_stale: 7,
                ..
            }
        ));
        assert_eq!(c.remote().get("psync_ch_5").await.unwrap(), None);
        assert_eq!(c.read_index().await.unwrap().unwrap().chunk_count, 1);
        assert!(matches!(c.pull_remote().await.unwrap(), PullOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn shrinking_write_removes_stale_chunks() {
        let c = controller_with(SyncConfig::default().with_max_chunk_bytes(64));
        let big: Vec<Record> = (0..6)
            .map(|i| rec(&format!("id{i}"), &"x".repeat(40), i))
            .collect();
        let PushOutcome::Pushed { chunk_count, .. } = c.push_local(&big).await.unwrap() else {
            panic!("expected push");
        };
        assert!(chunk_count > 2);

        let outcome = c.push_local(&[rec("a", "y", 1)]).await.unwrap();
        let PushOutcome::Pushed {
            chunk_count: small,
            removed_stale,
            ..
        } = outcome
        else {
            panic!("expected push");
        };
        assert_eq!(removed_stale, chunk_count - small);

        let chunk_keys: Vec<String> = c
            .remote()
            .keys()
            .into_iter()
            .filter(|k| k.starts_with("psync_ch_"))
            .collect();
        assert_eq!(chunk_keys.len(), small);
    }

    #[tokio::test]
    async fn disabled_controller_does_nothing() {
        let c = controller();
        c.set_enabled(false).await.unwrap();

        assert_eq!(
            c.push_local(&[rec("a", "x", 1)]).await.unwrap(),
            PushOutcome::Skipped(SkipReason::Disabled)
        );
        assert_eq!(
            c.pull_remote().await.unwrap(),
            PullOutcome::Skipped(SkipReason::Disabled)
        );
        assert!(c.remote().keys().is_empty());
        assert_eq!(c.local().get("syncEnabled").await.unwrap(), Some(json!(false)));
    }

    #[tokio::test]
    async fn settings_load_persisted_flag() {
        let c = controller();
        c.local().set("syncEnabled", json!(false)).await.unwrap();
        assert!(!c.load_settings().await.unwrap());
        assert!(!c.is_enabled());
    }

    #[tokio::test]
    async fn bootstrap_seeds_only_empty_remote() {
        let c = controller();
        assert_eq!(
            c.bootstrap().await.unwrap(),
            PushOutcome::Skipped(SkipReason::NothingToPush)
        );

        set_local(&c, &[rec("a", "x", 1)]).await;
        assert!(matches!(
            c.bootstrap().await.unwrap(),
            PushOutcome::Pushed { chunk_count: 1, .. }
        ));
        assert_eq!(
            c.bootstrap().await.unwrap(),
            PushOutcome::Skipped(SkipReason::RemoteHasData)
        );
    }

    #[tokio::test]
    async fn store_failure_is_reported_and_recoverable() {
        let c = controller();
        c.remote().fail_next_writes(1);

        let err = c.push_local(&[rec("a", "x", 1)]).await.unwrap_err();
        assert!(err.is_transient());
        assert!(c.ledger().last_written().is_none());

        assert!(matches!(
            c.push_local(&[rec("a", "x", 1)]).await.unwrap(),
            PushOutcome::Pushed { .. }
        ));
    }

    #[tokio::test]
    async fn echo_of_apply_is_not_accepted() {
        let writer = controller();
        writer.push_local(&[rec("a", "remote", 2)]).await.unwrap();

        let reader = SyncController::new(
            SyncConfig::default(),
            Arc::new(InMemoryStore::new()),
            Arc::clone(writer.remote()),
        );
        let mut changes = reader.local().subscribe();
        reader.pull_remote().await.unwrap();

        let echo = changes.try_recv().unwrap();
        assert!(!reader.accept_local_change(&echo));

        set_local(&reader, &[rec("b", "typed", 3)]).await;
        let edit = changes.try_recv().unwrap();
        assert!(reader.accept_local_change(&edit));
    }

    #[tokio::test]
    async fn unrelated_local_keys_are_ignored() {
        let c = controller();
        let mut changes = c.local().subscribe();
        c.local().set("draftPrompt", json!({})).await.unwrap();
        assert!(!c.accept_local_change(&changes.try_recv().unwrap()));
    }

    #[test]
    fn sync_change_detection() {
        let c = controller_with(
            SyncConfig::default().with_layout(ChunkLayout::new("idx", "part_")),
        );
        assert!(c.is_sync_change(["idx"]));
        assert!(c.is_sync_change(["other", "part_3"]));
        assert!(!c.is_sync_change(["psync_index"]));
    }
}
