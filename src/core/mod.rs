//! Core persistence logic.
//!
//! This module contains:
//! - SnapshotStore: whole-catalog JSON snapshot, rewritten atomically

pub mod snapshot_store;

// Re-export commonly used types
pub use snapshot_store::{BookRecord, SnapshotError, SnapshotStore};
