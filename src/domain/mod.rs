//! Domain types for the book catalog.
//!
//! This module contains the core data structures:
//! - Book: the entity and its closed set of variants
//! - Loan: lend/return rules and due-date arithmetic

pub mod book;
pub mod loan;

// Re-export commonly used types
pub use book::{Book, BookKind, BookType};
pub use loan::{due_date_for, LendError, LoanStatus, LOAN_PERIOD_DAYS};
