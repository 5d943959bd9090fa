//! # ShelfSync Storage
//!
//! Key-value store contract and backends for ShelfSync.
//!
//! The sync engine sits between two stores that share one interface: a
//! device-local store holding the canonical collection, and a replicated
//! remote store with a hard per-item byte ceiling. Both are modelled as
//! **JSON value maps** with a change subscription.
//!
//! ## Design Principles
//!
//! - Stores do not interpret the values they hold
//! - Every logical write emits exactly one [`ChangeSet`] per subscriber
//! - No transactions: a batch is applied whole or rejected whole, but
//!   readers on other devices may see it piecemeal
//! - Must be `Send + Sync` for sharing between tasks
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For tests and simulated remote replicas
//! - [`FileStore`] - A JSON file on disk, used by the CLI profiles
//!
//! ## Example
//!
//! ```rust
//! use shelfsync_storage::{InMemoryStore, KvStore};
//! use serde_json::json;
//!
//! # async fn demo() -> shelfsync_storage::StoreResult<()> {
//! let store = InMemoryStore::new();
//! store.set("syncEnabled", json!(true)).await?;
//! assert_eq!(store.get("syncEnabled").await?, Some(json!(true)));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod feed;
mod file;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use feed::ChangeFeed;
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::{item_size, ChangeSet, Entries, KvStore, StorageChange};
