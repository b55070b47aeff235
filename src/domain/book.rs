//! Book entity and its variants.
//!
//! Every book shares the same identity and bibliographic fields; the
//! variant only contributes one descriptive string and, for reference
//! works, the rule that they never leave the shelf.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stable tag identifying a book variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BookType {
    #[serde(rename = "Fiction")]
    Fiction,

    #[serde(rename = "Non-Fiction")]
    NonFiction,

    #[serde(rename = "Reference")]
    Reference,
}

impl BookType {
    /// All variants, in display order
    pub const ALL: [BookType; 3] = [BookType::Fiction, BookType::NonFiction, BookType::Reference];

    /// The tag string used on disk and in listings
    pub fn as_str(&self) -> &'static str {
        match self {
            BookType::Fiction => "Fiction",
            BookType::NonFiction => "Non-Fiction",
            BookType::Reference => "Reference",
        }
    }

    /// Label of the variant-specific field
    pub fn detail_label(&self) -> &'static str {
        match self {
            BookType::Fiction => "Genre",
            BookType::NonFiction => "Subject",
            BookType::Reference => "Category",
        }
    }
}

impl std::fmt::Display for BookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Variant payload: exactly one descriptive field per kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookKind {
    Fiction { genre: String },
    NonFiction { subject: String },
    Reference { category: String },
}

impl BookKind {
    /// Build the payload for a variant from its tag and detail string
    pub fn new(book_type: BookType, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match book_type {
            BookType::Fiction => BookKind::Fiction { genre: detail },
            BookType::NonFiction => BookKind::NonFiction { subject: detail },
            BookType::Reference => BookKind::Reference { category: detail },
        }
    }

    pub fn book_type(&self) -> BookType {
        match self {
            BookKind::Fiction { .. } => BookType::Fiction,
            BookKind::NonFiction { .. } => BookType::NonFiction,
            BookKind::Reference { .. } => BookType::Reference,
        }
    }

    /// The raw variant-specific value (genre, subject or category)
    pub fn detail(&self) -> &str {
        match self {
            BookKind::Fiction { genre } => genre,
            BookKind::NonFiction { subject } => subject,
            BookKind::Reference { category } => category,
        }
    }
}

/// A book in the catalog.
///
/// Loan fields are private: they only change through [`Book::set_on_loan`]
/// and the lending operations in [`crate::domain::loan`]. Lending and
/// returning keep `borrower`, `loan_date` and `due_date` present exactly
/// while the book is on loan; see [`Book::has_consistent_loan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    isbn: String,

    /// Title as entered by the librarian
    pub title: String,

    pub author: String,

    pub publication_year: i32,

    kind: BookKind,

    pub(crate) on_loan: bool,
    pub(crate) borrower: Option<String>,
    pub(crate) loan_date: Option<NaiveDate>,
    pub(crate) due_date: Option<NaiveDate>,
}

impl Book {
    /// Create an available book
    pub fn new(
        kind: BookKind,
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            publication_year,
            kind,
            on_loan: false,
            borrower: None,
            loan_date: None,
            due_date: None,
        }
    }

    pub fn fiction(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
        genre: impl Into<String>,
    ) -> Self {
        Self::new(
            BookKind::Fiction { genre: genre.into() },
            isbn,
            title,
            author,
            publication_year,
        )
    }

    pub fn non_fiction(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
        subject: impl Into<String>,
    ) -> Self {
        Self::new(
            BookKind::NonFiction {
                subject: subject.into(),
            },
            isbn,
            title,
            author,
            publication_year,
        )
    }

    pub fn reference(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publication_year: i32,
        category: impl Into<String>,
    ) -> Self {
        Self::new(
            BookKind::Reference {
                category: category.into(),
            },
            isbn,
            title,
            author,
            publication_year,
        )
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    /// Variant payload
    pub fn kind(&self) -> &BookKind {
        &self.kind
    }

    /// Change the variant. Turning a book into a reference work ends any
    /// loan, since reference books never leave the shelf.
    pub fn set_kind(&mut self, kind: BookKind) {
        self.kind = kind;
        if self.is_reference() {
            self.clear_loan();
        }
    }

    /// Variant tag ("Fiction", "Non-Fiction" or "Reference")
    pub fn book_type(&self) -> BookType {
        self.kind.book_type()
    }

    /// Human-readable rendering of the variant field, e.g. "Genre: Thriller"
    pub fn details(&self) -> String {
        format!("{}: {}", self.book_type().detail_label(), self.kind.detail())
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, BookKind::Reference { .. })
    }

    pub fn is_on_loan(&self) -> bool {
        self.on_loan
    }

    /// Set the loan flag. Reference books ignore the request and stay
    /// available. Clearing the flag also drops borrower and dates; setting
    /// it does not invent them, so a book flagged this way is rejected by
    /// [`crate::Catalog::update`] until it has all three.
    pub fn set_on_loan(&mut self, on_loan: bool) {
        if on_loan && !self.is_reference() {
            self.on_loan = true;
        } else {
            self.clear_loan();
        }
    }

    /// Whether borrower, loan date and due date are present exactly when
    /// the book is on loan
    pub fn has_consistent_loan(&self) -> bool {
        let fields = [
            self.borrower.is_some(),
            self.loan_date.is_some(),
            self.due_date.is_some(),
        ];
        fields.iter().all(|&present| present == self.on_loan)
    }

    pub fn borrower(&self) -> Option<&str> {
        self.borrower.as_deref()
    }

    pub fn loan_date(&self) -> Option<NaiveDate> {
        self.loan_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Whether `keyword` occurs in the title, author or ISBN, ignoring case.
    /// `keyword` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, keyword: &str) -> bool {
        self.title.to_lowercase().contains(keyword)
            || self.author.to_lowercase().contains(keyword)
            || self.isbn.to_lowercase().contains(keyword)
    }
}
