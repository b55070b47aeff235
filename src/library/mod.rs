//! Book catalog management.
//!
//! The catalog owns the collection of books, enforces ISBN uniqueness and
//! routes every change through the lending rules and the snapshot store.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.bookshelf/
//! ├── books.json          # Snapshot of every book, rewritten on each change
//! └── books.json.lock     # Advisory lock held while saving
//! ```
//!
//! The lock file is created on the first save and left in place afterwards;
//! only the lock on it is released.

pub mod catalog;
pub mod report;

pub use catalog::{Catalog, CatalogError};
pub use report::{LoanEntry, LoanReport};
