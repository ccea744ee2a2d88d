#![deny(warnings)]
#![allow(missing_docs)]
//! Core functionality for the rolodex multi-index map.
//!
//! This crate provides an in-memory key-value map augmented with named
//! secondary indices. Each index classifies values under derived string keys
//! produced by caller-supplied key factories, so entries can be looked up by
//! primary key in O(1) or by any registered classification without scanning
//! the full data set. Indices registered after data exists are backfilled
//! from the current entries, and every mutation keeps all index views
//! consistent with the primary store.
//!
//! The structure is single-threaded by design: it provides no internal
//! locking, and concurrent callers must guard the whole map behind one
//! exclusive lock.

use tracing::{debug, instrument};

/// Structured error types for map and index operations
pub mod error;
/// Multi-index map implementation and query surface
pub mod map;

mod index;

// Re-export the public surface
pub use error::{RolodexError, RolodexResult};
pub use map::{BucketView, IndexStats, MultiIndexMap, RegistryStats};

/// Initialize the core components
#[instrument]
pub fn init() -> anyhow::Result<()> {
    debug!("Initializing rolodex core");
    Ok(())
}
