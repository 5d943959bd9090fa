//! # ShelfSync Testkit
//!
//! Test utilities for ShelfSync.
//!
//! This crate provides:
//! - Record and store fixtures
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelfsync_testkit::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn ids_are_unique(c in collection_strategy(0..10)) {
//!         // ...
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
