//! # ShelfSync Shelf
//!
//! Operations on the locally stored record collection: listing, search,
//! capture, categorisation, import and export, and the editor draft.
//!
//! The shelf only ever talks to the local store. Keeping the collection in
//! sync with other devices is the sync engine's job; it observes the writes
//! made here through the store's change feed.
//!
//! ```no_run
//! use shelfsync_shelf::{NewRecord, Shelf};
//! use shelfsync_storage::InMemoryStore;
//! use std::sync::Arc;
//!
//! async fn demo() -> shelfsync_shelf::ShelfResult<()> {
//!     let shelf = Shelf::new(Arc::new(InMemoryStore::new()));
//!     shelf.capture("Explain this stack trace line by line").await?;
//!     for record in shelf.search("stack").await? {
//!         println!("{}", record.title);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod draft;
mod error;
mod seed;
mod shelf;

pub use draft::{parse_tags, title_from_text, Draft, UNTITLED};
pub use error::{ShelfError, ShelfResult};
pub use seed::sample_records;
pub use shelf::{NewRecord, Shelf, COLLECTION_KEY, DRAFT_KEY};
