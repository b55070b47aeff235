//! Loan report: who has what, and what is late.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::Book;

/// One loaned book in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanEntry {
    pub isbn: String,
    pub title: String,
    pub borrower: String,
    pub due_date: NaiveDate,

    /// Days remaining for active loans, days overdue for late ones
    pub days: i64,
}

/// Loans split into active and overdue, in catalog order
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoanReport {
    pub active: Vec<LoanEntry>,
    pub overdue: Vec<LoanEntry>,
}

impl LoanReport {
    /// Build a report for `books` as of `today`
    pub fn build(books: &[Book], today: NaiveDate) -> Self {
        let mut report = Self::default();

        for book in books {
            let (Some(due_date), Some(days)) = (book.due_date(), book.days_until_due(today)) else {
                continue;
            };

            let entry = LoanEntry {
                isbn: book.isbn().to_string(),
                title: book.title.clone(),
                borrower: book.borrower().unwrap_or_default().to_string(),
                due_date,
                days: days.abs(),
            };

            if days >= 0 {
                report.active.push(entry);
            } else {
                report.overdue.push(entry);
            }
        }

        report
    }

    /// Total books currently on loan
    pub fn total_loans(&self) -> usize {
        self.active.len() + self.overdue.len()
    }

    pub fn overdue_count(&self) -> usize {
        self.overdue.len()
    }
}
