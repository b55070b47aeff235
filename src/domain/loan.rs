//! Lending lifecycle for a single book.
//!
//! A book is either `Available` or `OnLoan`. Reference books are pinned to
//! `Available`. Lending stamps the borrower, the loan date and a due date a
//! fixed [`LOAN_PERIOD_DAYS`] later; returning clears all three.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::book::Book;

/// Days between the loan date and the due date
pub const LOAN_PERIOD_DAYS: u64 = 14;

/// Loan state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Available,
    OnLoan,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Available => "Available",
            LoanStatus::OnLoan => "On Loan",
        };
        f.pad(label)
    }
}

/// Rejected lend or return requests
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendError {
    #[error("Book {0} is already on loan")]
    AlreadyOnLoan(String),

    #[error("Reference book {0} cannot be loaned")]
    NotLendable(String),

    #[error("Borrower name is required")]
    EmptyBorrower,

    #[error("Book {0} is not on loan")]
    NotOnLoan(String),

    #[error("Due date for a loan starting {0} is out of range")]
    DueDateOutOfRange(NaiveDate),
}

/// Due date for a loan starting on `loan_date`, `None` past the calendar's end
pub fn due_date_for(loan_date: NaiveDate) -> Option<NaiveDate> {
    loan_date.checked_add_days(Days::new(LOAN_PERIOD_DAYS))
}

impl Book {
    pub fn loan_status(&self) -> LoanStatus {
        if self.on_loan {
            LoanStatus::OnLoan
        } else {
            LoanStatus::Available
        }
    }

    /// Lend the book to `borrower` starting `today`.
    pub fn lend(&mut self, borrower: &str, today: NaiveDate) -> Result<(), LendError> {
        if self.is_reference() {
            return Err(LendError::NotLendable(self.isbn().to_string()));
        }
        if self.on_loan {
            return Err(LendError::AlreadyOnLoan(self.isbn().to_string()));
        }
        let borrower = borrower.trim();
        if borrower.is_empty() {
            return Err(LendError::EmptyBorrower);
        }
        let due = due_date_for(today).ok_or(LendError::DueDateOutOfRange(today))?;

        self.set_on_loan(true);
        self.borrower = Some(borrower.to_string());
        self.loan_date = Some(today);
        self.due_date = Some(due);
        Ok(())
    }

    /// Take the book back, clearing borrower and dates.
    pub fn return_loan(&mut self) -> Result<(), LendError> {
        if !self.on_loan {
            return Err(LendError::NotOnLoan(self.isbn().to_string()));
        }
        self.clear_loan();
        Ok(())
    }

    /// True when the book is on loan and its due date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.on_loan && self.due_date.is_some_and(|due| due < today)
    }

    /// Signed days from `today` to the due date; negative means overdue.
    /// `None` for books that are not on loan.
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        if !self.on_loan {
            return None;
        }
        self.due_date.map(|due| (due - today).num_days())
    }

    /// Reset to the available state with no loan fields
    pub(crate) fn clear_loan(&mut self) {
        self.on_loan = false;
        self.borrower = None;
        self.loan_date = None;
        self.due_date = None;
    }
}
