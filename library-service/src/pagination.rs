//! Cursor pagination for list operations
//!
//! Collections are totally ordered by identifier. A page token is an opaque,
//! URL-safe encoding of the identifier the next page starts at (inclusive);
//! the empty token means "from the beginning" and an empty
//! `next_page_token` means there are no more results.
//!
//! Listing fetches one row more than the page size. If that extra row
//! exists it is dropped from the page and its identifier becomes the next
//! cursor, so no count query is ever needed.
//!
//! # Example
//!
//! ```rust
//! use library_service::pagination::{decode_page_token, encode_page_token};
//!
//! let token = encode_page_token("dune");
//! assert_eq!(decode_page_token(&token).unwrap().as_deref(), Some("dune"));
//! assert_eq!(decode_page_token("").unwrap(), None);
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::naming::{validate_id, NameError};
use crate::repository::Record;

/// Query parameters accepted by list operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Requested page size; unset, zero or negative selects the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_page_size: Option<i64>,

    /// Token from a previous response's `next_page_token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl PageRequest {
    pub fn with_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    pub fn with_page_token(mut self, page_token: impl Into<String>) -> Self {
        self.page_token = Some(page_token.into());
        self
    }
}

/// Why a page token was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageTokenError {
    #[error("page token is not valid base64url")]
    Encoding,

    #[error("page token does not contain a cursor")]
    Malformed,

    #[error("page token cursor is invalid: {0}")]
    Cursor(#[from] NameError),
}

#[derive(Debug, Serialize, Deserialize)]
struct Cursor {
    start: String,
}

/// Encode the identifier the next page starts at
pub fn encode_page_token(start: &str) -> String {
    let cursor = Cursor {
        start: start.to_string(),
    };
    // Serializing a single string field cannot fail
    let json = serde_json::to_vec(&cursor).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a page token; the empty token yields `None`
pub fn decode_page_token(token: &str) -> Result<Option<String>, PageTokenError> {
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| PageTokenError::Encoding)?;
    let cursor: Cursor = serde_json::from_slice(&bytes).map_err(|_| PageTokenError::Malformed)?;
    validate_id(&cursor.start)?;

    Ok(Some(cursor.start))
}

/// Page size bounds applied to every list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    default_page_size: usize,
    max_page_size: usize,
}

impl Paging {
    pub fn new(default_page_size: usize, max_page_size: usize) -> Self {
        Self {
            default_page_size,
            max_page_size,
        }
    }

    /// Effective page size for a requested `max_page_size`
    pub fn page_size(&self, requested: Option<i64>) -> usize {
        match requested {
            Some(size) if size > 0 => usize::try_from(size)
                .unwrap_or(usize::MAX)
                .min(self.max_page_size),
            _ => self.default_page_size,
        }
    }
}

impl Default for Paging {
    fn default() -> Self {
        PaginationConfig::default().into()
    }
}

impl From<PaginationConfig> for Paging {
    fn from(config: PaginationConfig) -> Self {
        Self::new(config.default_page_size, config.max_page_size)
    }
}

/// One page of results and the token for the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub next_page_token: String,
}

impl<R: Record> Page<R> {
    /// Build a page from a scan of up to `page_size + 1` rows
    pub fn from_lookahead(mut rows: Vec<R>, page_size: usize) -> Self {
        let next_page_token = if rows.len() > page_size {
            let next = rows.swap_remove(page_size);
            rows.truncate(page_size);
            encode_page_token(next.id())
        } else {
            String::new()
        };

        Self {
            items: rows,
            next_page_token,
        }
    }

    pub fn map<T>(self, f: impl FnMut(R) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}
