//! Background sync service.
//!
//! A single reactor task owns the propagation scheduler. Store notifications
//! are forwarded into its inbox, debounced, and every propagation runs on the
//! reactor itself, so no two propagations ever overlap.

use crate::controller::SyncController;
use crate::error::{SyncError, SyncResult};
use crate::scheduler::{Propagation, PropagationScheduler};
use shelfsync_storage::{ChangeSet, KvStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Messages handled by the reactor.
#[derive(Debug)]
pub enum SyncEvent {
    /// The local store changed.
    LocalChanged(ChangeSet),
    /// These remote keys changed.
    RemoteChanged(Vec<String>),
    /// Enable or disable sync.
    SetEnabled(bool, oneshot::Sender<SyncResult<()>>),
    /// Run every pending propagation now.
    Flush(oneshot::Sender<()>),
    /// Run pending propagations, then stop.
    Shutdown,
}

/// Spawns the reactor for a controller.
pub struct SyncService;

impl SyncService {
    /// Subscribes to both stores and starts the reactor.
    ///
    /// The reactor runs the startup sequence before handling any event.
    /// Must be called from within a tokio runtime.
    pub fn spawn<L, R>(controller: Arc<SyncController<L, R>>) -> SyncHandle
    where
        L: KvStore + ?Sized + 'static,
        R: KvStore + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel(controller.config().event_capacity);

        // Subscribe before spawning so no write after this call is missed.
        let mut local_changes = controller.local().subscribe();
        let mut remote_changes = controller.remote().subscribe();

        let local_tx = tx.clone();
        let local_forwarder = tokio::spawn(async move {
            while let Some(change) = local_changes.recv().await {
                if local_tx.send(SyncEvent::LocalChanged(change)).await.is_err() {
                    break;
                }
            }
        });

        let remote_tx = tx.clone();
        let remote_forwarder = tokio::spawn(async move {
            while let Some(change) = remote_changes.recv().await {
                let keys = change.keys().map(str::to_owned).collect();
                if remote_tx.send(SyncEvent::RemoteChanged(keys)).await.is_err() {
                    break;
                }
            }
        });

        let task = tokio::spawn(async move {
            Reactor::new(controller, rx).run().await;
            local_forwarder.abort();
            remote_forwarder.abort();
        });

        SyncHandle { tx, task }
    }
}

/// Handle to a running sync service.
pub struct SyncHandle {
    tx: mpsc::Sender<SyncEvent>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Reports a local change not seen through the store subscription.
    pub async fn local_changed(&self, change: ChangeSet) -> SyncResult<()> {
        self.send(SyncEvent::LocalChanged(change)).await
    }

    /// Reports changed remote keys not seen through the store subscription.
    pub async fn remote_changed(&self, keys: Vec<String>) -> SyncResult<()> {
        self.send(SyncEvent::RemoteChanged(keys)).await
    }

    /// Enables or disables sync. Disabling drops pending propagations.
    pub async fn set_enabled(&self, enabled: bool) -> SyncResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncEvent::SetEnabled(enabled, reply)).await?;
        rx.await.map_err(|_| SyncError::ServiceStopped)?
    }

    /// Runs every pending propagation without waiting for its window.
    pub async fn flush(&self) -> SyncResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SyncEvent::Flush(reply)).await?;
        rx.await.map_err(|_| SyncError::ServiceStopped)
    }

    /// Stops the reactor after running pending propagations.
    pub async fn shutdown(self) -> SyncResult<()> {
        // Already stopped is fine.
        let _ = self.tx.send(SyncEvent::Shutdown).await;
        self.task.await.map_err(|_| SyncError::ServiceStopped)
    }

    /// Returns true if the reactor has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    async fn send(&self, event: SyncEvent) -> SyncResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| SyncError::ServiceStopped)
    }
}

struct Reactor<L: ?Sized, R: ?Sized> {
    controller: Arc<SyncController<L, R>>,
    inbox: mpsc::Receiver<SyncEvent>,
    scheduler: PropagationScheduler,
}

impl<L, R> Reactor<L, R>
where
    L: KvStore + ?Sized,
    R: KvStore + ?Sized,
{
    fn new(controller: Arc<SyncController<L, R>>, inbox: mpsc::Receiver<SyncEvent>) -> Self {
        let config = controller.config();
        let scheduler =
            PropagationScheduler::new(config.outbound_debounce, config.inbound_debounce);
        Self {
            controller,
            inbox,
            scheduler,
        }
    }

    async fn run(mut self) {
        self.controller.start().await;
        tracing::debug!("sync reactor started");

        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                event = self.inbox.recv() => match event {
                    Some(SyncEvent::Shutdown) | None => break,
                    Some(event) => self.handle(event).await,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let due = self.scheduler.take_due(Instant::now());
                    self.execute(due).await;
                }
            }
        }

        let pending = self.scheduler.drain();
        self.execute(pending).await;
        tracing::debug!("sync reactor stopped");
    }

    async fn handle(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::LocalChanged(change) => {
                // Always consulted so the echo guard disarms on every event.
                let accepted = self.controller.accept_local_change(&change);
                if accepted && self.controller.is_enabled() {
                    self.scheduler.local_changed(Instant::now());
                }
            }
            SyncEvent::RemoteChanged(keys) => {
                if self.controller.is_enabled()
                    && self.controller.is_sync_change(keys.iter().map(String::as_str))
                {
                    self.scheduler.remote_changed(Instant::now());
                }
            }
            SyncEvent::SetEnabled(enabled, reply) => {
                if !enabled {
                    self.scheduler.cancel_all();
                }
                let result = self.controller.set_enabled(enabled).await;
                let _ = reply.send(result);
            }
            SyncEvent::Flush(reply) => {
                let pending = self.scheduler.drain();
                self.execute(pending).await;
                let _ = reply.send(());
            }
            SyncEvent::Shutdown => {}
        }
    }

    async fn execute(&self, propagations: Vec<Propagation>) {
        for propagation in propagations {
            match propagation {
                Propagation::Pull => match self.controller.pull_remote().await {
                    Ok(outcome) => tracing::debug!(?outcome, "pull finished"),
                    Err(e) => tracing::warn!(error = %e, "pull abandoned"),
                },
                Propagation::Push => match self.controller.push_current().await {
                    Ok(outcome) => tracing::debug!(?outcome, "push finished"),
                    Err(e) => tracing::warn!(error = %e, "push abandoned"),
                },
            }
        }
    }
}
