//! Shelf operations on file-backed profiles, synced through a shared file.

use shelfsync_shelf::{NewRecord, Shelf};
use shelfsync_storage::FileStore;
use shelfsync_sync_engine::{PullOutcome, SyncConfig, SyncController, REMOTE_ITEM_QUOTA};
use std::sync::Arc;
use tempfile::TempDir;

fn open(dir: &TempDir, name: &str) -> Arc<FileStore> {
    Arc::new(FileStore::open(&dir.path().join(name)).unwrap())
}

#[tokio::test]
async fn edits_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let shelf = Shelf::new(open(&dir, "local.json"));
        shelf
            .add(NewRecord {
                title: "keep".into(),
                text: "me".into(),
                ..NewRecord::default()
            })
            .await
            .unwrap();
    }

    let reopened = Shelf::new(open(&dir, "local.json"));
    let records = reopened.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "keep");
}

#[tokio::test]
async fn profiles_sync_through_remote_file() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(
        FileStore::open(&dir.path().join("remote.json"))
            .unwrap()
            .with_item_quota(REMOTE_ITEM_QUOTA),
    );

    let laptop = Shelf::new(open(&dir, "laptop.json"));
    let desktop = Shelf::new(open(&dir, "desktop.json"));
    laptop.seed_if_empty().await.unwrap();
    let captured = desktop.capture("review the quarterly numbers").await.unwrap();

    let laptop_sync = SyncController::new(
        SyncConfig::default(),
        Arc::clone(laptop.store()),
        Arc::clone(&remote),
    );
    let desktop_sync = SyncController::new(
        SyncConfig::default(),
        Arc::clone(desktop.store()),
        Arc::clone(&remote),
    );

    laptop_sync.sync_now().await.unwrap();
    let (pulled, _) = desktop_sync.sync_now().await.unwrap();
    assert!(matches!(pulled, PullOutcome::Applied { added: 3, .. }));
    laptop_sync.pull_remote().await.unwrap();

    assert_eq!(laptop.list().await.unwrap().len(), 4);
    assert_eq!(desktop.list().await.unwrap().len(), 4);
    assert!(laptop.get(&captured.id).await.unwrap().is_some());
}
