//! # ShelfSync Codec
//!
//! Record model and remote wire format for ShelfSync.
//!
//! This crate provides:
//! - [`Record`] and [`Category`], the unit of user data
//! - Payload encoding: a collection plus a write timestamp as one JSON string
//! - Byte-bounded chunking that never splits a character
//! - A fast, platform-independent payload fingerprint
//! - The [`SyncIndex`] descriptor and chunk key layout
//!
//! This is a pure crate with no I/O operations.
//!
//! ## Usage
//!
//! ```
//! use shelfsync_codec::{encode_payload, split_chunks, join_chunks, fingerprint, Record};
//!
//! let records = vec![Record::with_id("a", "", "hello", 100)];
//! let payload = encode_payload(&records, 1_700_000_000_000).unwrap();
//!
//! let chunks = split_chunks(&payload, 16).unwrap();
//! assert!(chunks.iter().all(|c| c.len() <= 16));
//! assert_eq!(join_chunks(chunks.iter().map(|c| Some(c.as_str()))), payload);
//!
//! let hash = fingerprint(&payload);
//! assert!(!hash.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod clock;
mod error;
mod fingerprint;
mod index;
mod payload;
mod record;

pub use chunk::{join_chunks, split_chunks, DEFAULT_MAX_CHUNK_BYTES};
pub use clock::now_millis;
pub use error::{CodecError, CodecResult};
pub use fingerprint::fingerprint;
pub use index::{ChunkLayout, SyncIndex, INDEX_VERSION};
pub use payload::{decode_payload, encode_payload, SyncPayload};
pub use record::{Category, Record};
