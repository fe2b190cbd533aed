//! Resource identifiers and hierarchical resource names
//!
//! Every resource is addressed by a path built from validated identifier
//! segments:
//!
//! - shelves: `shelves/{shelf}`
//! - books: `shelves/{shelf}/books/{book}`
//!
//! Identifiers are either supplied by the client (and validated here) or
//! generated as hyphenated UUIDv4 strings, which satisfy the same pattern.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;

/// Collection segment for shelves
pub const SHELVES: &str = "shelves";

/// Collection segment for books
pub const BOOKS: &str = "books";

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\-]+$").expect("identifier regex is valid"));

/// Why an identifier or resource name was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("invalid identifier '{0}': only letters, digits and '-' are allowed")]
    InvalidId(String),

    #[error("invalid resource name '{name}': expected {expected}")]
    InvalidName { name: String, expected: &'static str },
}

/// Check a client-supplied identifier against `^[a-zA-Z0-9-]+$`
pub fn validate_id(raw: &str) -> Result<&str, NameError> {
    if raw.is_empty() {
        return Err(NameError::Empty);
    }
    if !ID_PATTERN.is_match(raw) {
        return Err(NameError::InvalidId(raw.to_string()));
    }
    Ok(raw)
}

/// Generate a fresh identifier for a resource the client did not name
pub fn generate_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Use the supplied identifier when present and non-empty, otherwise generate one
pub fn resolve_id(requested: Option<&str>) -> Result<String, NameError> {
    match requested {
        Some(raw) if !raw.is_empty() => validate_id(raw).map(str::to_string),
        _ => Ok(generate_id()),
    }
}

pub fn shelf_path(shelf_id: &str) -> String {
    format!("{SHELVES}/{shelf_id}")
}

pub fn book_path(shelf_id: &str, book_id: &str) -> String {
    format!("{SHELVES}/{shelf_id}/{BOOKS}/{book_id}")
}

/// Validated name of a shelf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShelfName {
    shelf: String,
}

impl ShelfName {
    pub fn new(shelf: &str) -> Result<Self, NameError> {
        Ok(Self {
            shelf: validate_id(shelf)?.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.shelf
    }

    /// Name of a book in this shelf
    pub fn book(&self, book: &str) -> Result<BookName, NameError> {
        Ok(BookName {
            shelf: self.clone(),
            book: validate_id(book)?.to_string(),
        })
    }
}

impl fmt::Display for ShelfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shelf_path(&self.shelf))
    }
}

impl FromStr for ShelfName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NameError::InvalidName {
            name: s.to_string(),
            expected: "shelves/{shelf}",
        };
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [SHELVES, shelf] => Self::new(shelf).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Validated name of a book, including its parent shelf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookName {
    shelf: ShelfName,
    book: String,
}

impl BookName {
    pub fn new(shelf: &str, book: &str) -> Result<Self, NameError> {
        ShelfName::new(shelf)?.book(book)
    }

    pub fn parent(&self) -> &ShelfName {
        &self.shelf
    }

    pub fn shelf_id(&self) -> &str {
        self.shelf.id()
    }

    pub fn id(&self) -> &str {
        &self.book
    }
}

impl fmt::Display for BookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&book_path(self.shelf.id(), &self.book))
    }
}

impl FromStr for BookName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NameError::InvalidName {
            name: s.to_string(),
            expected: "shelves/{shelf}/books/{book}",
        };
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [SHELVES, shelf, BOOKS, book] => Self::new(shelf, book).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}
