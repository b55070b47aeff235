//! Command-line interface for bookshelf.
//!
//! Provides commands for adding, editing and removing books, searching the
//! catalog, lending and returning books, and reporting on loans.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use crate::core::SnapshotStore;
use crate::domain::{Book, BookKind, BookType};
use crate::library::Catalog;

/// bookshelf - Book catalog with lending and overdue tracking
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog snapshot file (overrides config)
    #[arg(long, global = true, env = "BOOKSHELF_DATA")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a book to the catalog
    Add {
        /// ISBN (must be unique)
        isbn: String,

        /// Book title
        title: String,

        /// Author name
        #[arg(short, long, default_value = "")]
        author: String,

        /// Publication year
        #[arg(short, long)]
        year: i32,

        /// Book type
        #[arg(short = 't', long = "type", value_enum, default_value = "fiction")]
        kind: KindArg,

        /// Genre, subject or category, depending on the type
        #[arg(short, long, default_value = "")]
        detail: String,
    },

    /// Remove a book
    Remove {
        /// ISBN of the book to remove
        isbn: String,
    },

    /// Edit a book's details
    Update {
        /// ISBN of the book to edit
        isbn: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        /// Change the book type (keeps the detail unless --detail is given)
        #[arg(short = 't', long = "type", value_enum)]
        kind: Option<KindArg>,

        #[arg(long)]
        detail: Option<String>,
    },

    /// Show details of a book
    Show {
        /// ISBN
        isbn: String,
    },

    /// Search title, author and ISBN
    Search {
        /// Keyword (case-insensitive)
        keyword: String,
    },

    /// List books in the catalog
    List {
        /// Filter by book type
        #[arg(short = 't', long = "type", value_enum)]
        kind: Option<KindArg>,
    },

    /// Lend a book
    Lend {
        /// ISBN of the book to lend
        isbn: String,

        /// Borrower's name
        borrower: String,
    },

    /// Return a loaned book
    Return {
        /// ISBN of the book being returned
        isbn: String,
    },

    /// Show active and overdue loans
    Loans,

    /// Show book counts by type
    Stats,

    /// Show resolved configuration (debug)
    Config,
}

/// Book type for CLI (maps to BookType)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Fiction,
    NonFiction,
    Reference,
}

impl From<KindArg> for BookType {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Fiction => BookType::Fiction,
            KindArg::NonFiction => BookType::NonFiction,
            KindArg::Reference => BookType::Reference,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if let Commands::Config = self.command {
            return show_config(self.data);
        }

        let store = match self.data {
            Some(path) => SnapshotStore::new(path),
            None => SnapshotStore::open_default()?,
        };
        let catalog = Catalog::open(store);
        let today = Local::now().date_naive();

        match self.command {
            Commands::Add {
                isbn,
                title,
                author,
                year,
                kind,
                detail,
            } => {
                let isbn = required("ISBN", &isbn)?;
                let title = required("Title", &title)?;
                let kind = BookKind::new(kind.into(), detail.trim());
                catalog.add(Book::new(kind, isbn, title, author.trim(), year))?;
                println!("Book added successfully!");
            }
            Commands::Remove { isbn } => {
                let book = catalog.remove(isbn.trim())?;
                println!("Removed: {} ({})", book.title, book.isbn());
            }
            Commands::Update {
                isbn,
                title,
                author,
                year,
                kind,
                detail,
            } => {
                let isbn = isbn.trim();
                let mut book = catalog
                    .find_by_isbn(isbn)
                    .with_context(|| format!("Book with ISBN {} not found", isbn))?;
                if let Some(title) = title {
                    book.title = required("Title", &title)?.to_string();
                }
                if let Some(author) = author {
                    book.author = author.trim().to_string();
                }
                if let Some(year) = year {
                    book.publication_year = year;
                }
                if kind.is_some() || detail.is_some() {
                    let book_type = kind.map(BookType::from).unwrap_or(book.book_type());
                    let detail = detail
                        .as_deref()
                        .map(str::trim)
                        .unwrap_or(book.kind().detail())
                        .to_string();
                    if book_type == BookType::Reference && book.is_on_loan() {
                        anyhow::bail!("Book {} is on loan and cannot become a reference book", isbn);
                    }
                    book.set_kind(BookKind::new(book_type, detail));
                }
                catalog.update(book)?;
                println!("Book updated successfully!");
            }
            Commands::Show { isbn } => {
                let book = catalog
                    .find_by_isbn(isbn.trim())
                    .with_context(|| format!("Book with ISBN {} not found", isbn.trim()))?;
                show_book(&book, today);
            }
            Commands::Search { keyword } => {
                print_books(&catalog.search(keyword.trim()));
            }
            Commands::List { kind } => {
                let books = match kind {
                    Some(kind) => catalog.filter_by_type(kind.into()),
                    None => catalog.list_all(),
                };
                print_books(&books);
            }
            Commands::Lend { isbn, borrower } => {
                let borrower = required("Borrower name", &borrower)?;
                let book = catalog.lend(isbn.trim(), borrower, today)?;
                println!(
                    "Lent \"{}\" to {}, due {}",
                    book.title,
                    borrower,
                    format_date(book.due_date())
                );
            }
            Commands::Return { isbn } => {
                let book = catalog.return_book(isbn.trim())?;
                println!("Returned \"{}\"", book.title);
            }
            Commands::Loans => show_loans(&catalog, today),
            Commands::Stats => show_stats(&catalog),
            // Handled before the catalog is opened
            Commands::Config => {}
        }

        if catalog.has_unsaved_changes() {
            eprintln!(
                "Warning: changes could not be saved to {}",
                catalog.store().path().display()
            );
        }

        Ok(())
    }
}

/// Trimmed input, rejecting empty values
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("{} is required", field);
    }
    Ok(value)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print books as a table
fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books found");
        return;
    }

    println!(
        "{:<16} {:<30} {:<20} {:<6} {:<12} {:<24} {:<10}",
        "ISBN", "TITLE", "AUTHOR", "YEAR", "TYPE", "DETAILS", "STATUS"
    );
    println!("{}", "-".repeat(124));

    for book in books {
        println!(
            "{:<16} {:<30} {:<20} {:<6} {:<12} {:<24} {:<10}",
            truncate(book.isbn(), 16),
            truncate(&book.title, 30),
            truncate(&book.author, 20),
            book.publication_year,
            book.book_type(),
            truncate(&book.details(), 24),
            book.loan_status()
        );
    }

    println!("\n{} book(s)", books.len());
}

/// Print every field of a single book
fn show_book(book: &Book, today: NaiveDate) {
    println!("ISBN: {}", book.isbn());
    println!("Title: {}", book.title);
    println!("Author: {}", book.author);
    println!("Year: {}", book.publication_year);
    println!("Type: {}", book.book_type());
    println!("{}", book.details());
    println!("Status: {}", book.loan_status());

    if let Some(borrower) = book.borrower() {
        println!("Borrower: {}", borrower);
        println!("Loan date: {}", format_date(book.loan_date()));
        println!("Due date: {}", format_date(book.due_date()));
        match book.days_until_due(today) {
            Some(days) if days < 0 => println!("Days overdue: {}", -days),
            Some(days) => println!("Days remaining: {}", days),
            None => {}
        }
    }
}

/// Print active and overdue loans
fn show_loans(catalog: &Catalog, today: NaiveDate) {
    let report = catalog.loan_report(today);

    println!("Total loans: {}", report.total_loans());
    println!("Overdue books: {}", report.overdue_count());

    if !report.active.is_empty() {
        println!("\nActive loans:");
        println!(
            "{:<30} {:<20} {:<12} {:<14}",
            "TITLE", "BORROWER", "DUE DATE", "DAYS REMAINING"
        );
        for entry in &report.active {
            println!(
                "{:<30} {:<20} {:<12} {:<14}",
                truncate(&entry.title, 30),
                truncate(&entry.borrower, 20),
                entry.due_date.format("%Y-%m-%d"),
                entry.days
            );
        }
    }

    if !report.overdue.is_empty() {
        println!("\nOverdue loans:");
        println!(
            "{:<30} {:<20} {:<12} {:<14}",
            "TITLE", "BORROWER", "DUE DATE", "DAYS OVERDUE"
        );
        for entry in &report.overdue {
            println!(
                "{:<30} {:<20} {:<12} {:<14}",
                truncate(&entry.title, 30),
                truncate(&entry.borrower, 20),
                entry.due_date.format("%Y-%m-%d"),
                entry.days
            );
        }
    }
}

/// Print book counts per type
fn show_stats(catalog: &Catalog) {
    let counts = catalog.counts_by_type();

    println!("{:<12} {:>6}", "TYPE", "BOOKS");
    for book_type in BookType::ALL {
        println!(
            "{:<12} {:>6}",
            book_type,
            counts.get(&book_type).copied().unwrap_or(0)
        );
    }
    println!("{:<12} {:>6}", "Total", catalog.len());
}

/// Show resolved configuration
fn show_config(data_override: Option<PathBuf>) -> Result<()> {
    let config = crate::config::config()?;

    println!("Home: {}", config.home.display());
    match data_override {
        Some(path) => println!("Data file: {} (override)", path.display()),
        None => println!("Data file: {}", config.data_file.display()),
    }
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }

    Ok(())
}

/// Shorten a string to `max` characters for table output
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_empty() {
        assert_eq!(required("ISBN", "  978  ").unwrap(), "978");
        assert!(required("ISBN", "   ").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dune", 10), "Dune");
        assert_eq!(truncate("The Lord of the Rings", 10), "The Lor...");
    }

    #[test]
    fn test_cli_parses_add() {
        let cli = Cli::try_parse_from([
            "bookshelf", "add", "A1", "Foo", "--author", "X", "--year", "2000", "--type",
            "non-fiction", "--detail", "History",
        ])
        .unwrap();

        match cli.command {
            Commands::Add {
                isbn, year, kind, ..
            } => {
                assert_eq!(isbn, "A1");
                assert_eq!(year, 2000);
                assert_eq!(BookType::from(kind), BookType::NonFiction);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
