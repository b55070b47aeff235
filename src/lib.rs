//! bookshelf - Book catalog with lending and snapshot persistence
//!
//! Tracks which books are on the shelf and which are out on loan, and keeps
//! the whole catalog in a single JSON snapshot that is rewritten after every
//! change.
//!
//! # Architecture
//!
//! - Books are a closed set of variants (Fiction, Non-Fiction, Reference)
//!   sharing ISBN, title, author and year
//! - Lending rules live on the book: 14-day loans, reference books never leave
//! - The catalog holds a copy-on-write collection, so reads never see a
//!   half-applied change
//! - Every successful mutation is followed by a full snapshot save
//!
//! # Modules
//!
//! - `domain`: Data structures and rules (Book, BookKind, loans)
//! - `library`: The catalog and loan reports
//! - `core`: Snapshot persistence
//! - `config`: Path resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! bookshelf add 978-0261102217 "The Hobbit" --author Tolkien --year 1937 --detail Fantasy
//! bookshelf lend 978-0261102217 "Alice"
//! bookshelf loans
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use self::core::{SnapshotError, SnapshotStore};
pub use domain::{Book, BookKind, BookType, LendError, LoanStatus, LOAN_PERIOD_DAYS};
pub use library::{Catalog, CatalogError, LoanReport};
