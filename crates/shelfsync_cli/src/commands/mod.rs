//! CLI command implementations.

pub mod inspect;
pub mod shelf;
pub mod sync;
pub mod transfer;

use shelfsync_shelf::Shelf;
use shelfsync_storage::FileStore;
use shelfsync_sync_engine::{SyncConfig, SyncController, REMOTE_ITEM_QUOTA};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the local store file inside a profile directory.
pub const LOCAL_FILE: &str = "local.json";

/// Name of the default remote store file inside a profile directory.
pub const REMOTE_FILE: &str = "remote.json";

/// Result type for command implementations.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// An opened profile: the local store and the remote store it syncs with.
pub struct Profile {
    /// Local store.
    pub local: Arc<FileStore>,
    /// Remote store, limited to the remote per-item quota.
    pub remote: Arc<FileStore>,
}

impl Profile {
    /// Opens `<dir>/local.json` and the remote file, creating both as needed.
    pub fn open(dir: &Path, remote: Option<&Path>) -> CommandResult<Self> {
        let remote_path = remote
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join(REMOTE_FILE));
        let local = FileStore::open(&dir.join(LOCAL_FILE))?;
        let remote = FileStore::open(&remote_path)?.with_item_quota(REMOTE_ITEM_QUOTA);
        tracing::debug!(
            local = %local.path().display(),
            remote = %remote.path().display(),
            "opened profile"
        );
        Ok(Self {
            local: Arc::new(local),
            remote: Arc::new(remote),
        })
    }

    /// Shelf over the local store.
    pub fn shelf(&self) -> Shelf<FileStore> {
        Shelf::new(Arc::clone(&self.local))
    }

    /// Sync controller between the two stores.
    pub fn controller(&self) -> SyncController<FileStore, FileStore> {
        SyncController::new(
            SyncConfig::default(),
            Arc::clone(&self.local),
            Arc::clone(&self.remote),
        )
    }

    /// Path of the local store file.
    pub fn local_path(&self) -> PathBuf {
        self.local.path().to_path_buf()
    }
}
