//! Stored records and wire representations for shelves and books
//!
//! Records are what the store persists. Resources are what clients see: the
//! same data with the derived resource `path` in place of raw identifiers.
//! Paths are always computed from identifiers and never stored.

use serde::{Deserialize, Serialize};

use crate::naming::{book_path, shelf_path};
use crate::repository::Record;

// ============================================================================
// Stored records
// ============================================================================

/// Persisted shelf row
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlite", derive(sqlx::FromRow))]
pub struct ShelfRecord {
    pub id: String,
    pub theme: String,
}

impl ShelfRecord {
    pub fn new(id: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            theme: theme.into(),
        }
    }
}

impl Record for ShelfRecord {
    const KIND: &'static str = "Shelf";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Persisted book row; `shelf_id` is fixed at creation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlite", derive(sqlx::FromRow))]
pub struct BookRecord {
    pub id: String,
    pub shelf_id: String,
    pub title: String,
    pub author: String,
}

impl BookRecord {
    pub fn new(
        id: impl Into<String>,
        shelf_id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            shelf_id: shelf_id.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

impl Record for BookRecord {
    const KIND: &'static str = "Book";

    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.shelf_id)
    }
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    pub path: String,
    pub theme: String,
}

impl From<ShelfRecord> for Shelf {
    fn from(record: ShelfRecord) -> Self {
        Self {
            path: shelf_path(&record.id),
            theme: record.theme,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub path: String,
    pub title: String,
    pub author: String,
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            path: book_path(&record.shelf_id, &record.id),
            title: record.title,
            author: record.author,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /shelves`; a `path` field, if sent, is ignored
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateShelf {
    pub theme: String,
}

/// Body of `POST /shelves/{shelf}/books`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
}

/// Sparse shelf update; absent (or `null`) fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShelfPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl ShelfPatch {
    pub fn has_updates(&self) -> bool {
        self.theme.is_some()
    }

    /// Overwrite the present fields of `record`
    pub fn apply(self, record: &mut ShelfRecord) {
        if let Some(theme) = self.theme {
            record.theme = theme;
        }
    }
}

/// Sparse book update; identifiers and the parent shelf are never patchable
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl BookPatch {
    pub fn has_updates(&self) -> bool {
        self.title.is_some() || self.author.is_some()
    }

    pub fn apply(self, record: &mut BookRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(author) = self.author {
            record.author = author;
        }
    }
}

// ============================================================================
// List responses
// ============================================================================

/// One page of shelves; `next_page_token` is empty on the last page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListShelvesResponse {
    pub shelves: Vec<Shelf>,
    pub next_page_token: String,
}

/// One page of books; `next_page_token` is empty on the last page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub books: Vec<Book>,
    pub next_page_token: String,
}
