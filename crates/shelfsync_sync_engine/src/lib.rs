//! # ShelfSync Sync Engine
//!
//! Keeps a record collection in a local key-value store mirrored to a
//! quota-limited remote key-value store.
//!
//! This crate provides:
//! - Change ledger for echo suppression
//! - Last-writer-wins reconciliation
//! - Debounced propagation scheduling
//! - The sync controller and its background reactor
//!
//! ## Architecture
//!
//! Outbound, the whole local collection is encoded as one payload, split
//! into byte-bounded chunks and written together with an index describing
//! them. Inbound, the chunks are reassembled, decoded and merged into the
//! local collection record by record.
//!
//! ## Key Invariants
//!
//! - A payload whose fingerprint was just written or applied is never
//!   propagated again
//! - Local wins ties; a remote record replaces a local one only if strictly
//!   newer
//! - At most one inbound apply is in flight
//! - A malformed remote payload never touches local data
//! - Disabled sync performs no reads or writes against either store

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod controller;
mod echo;
mod error;
mod ledger;
mod reconcile;
mod scheduler;
mod service;
mod settings;
mod state;

pub use config::{SyncConfig, REMOTE_ITEM_QUOTA, REMOTE_MAX_ITEMS};
pub use controller::SyncController;
pub use echo::EchoGuard;
pub use error::{SyncError, SyncResult};
pub use ledger::ChangeLedger;
pub use reconcile::{merge, merge_with_report, resolve, MergeReport, Resolution};
pub use scheduler::{Debouncer, Propagation, PropagationScheduler};
pub use service::{SyncEvent, SyncHandle, SyncService};
pub use settings::{ensure_default_enabled, read_enabled, write_enabled};
pub use state::{PullOutcome, PushOutcome, ShelfEvent, SkipReason, SyncStats};
