//! HTTP handlers and routing
//!
//! Routes follow the resource hierarchy:
//!
//! | Method | Path | Success |
//! |--------|------|---------|
//! | GET | `/shelves` | 200 `{shelves, next_page_token}` |
//! | POST | `/shelves?id=` | 201 Shelf |
//! | GET | `/shelves/{shelf_id}` | 200 Shelf |
//! | PATCH | `/shelves/{shelf_id}` | 200 Shelf |
//! | DELETE | `/shelves/{shelf_id}` | 204 |
//! | GET | `/shelves/{shelf_id}/books` | 200 `{books, next_page_token}` |
//! | POST | `/shelves/{shelf_id}/books?id=` | 201 Book |
//! | GET | `/shelves/{shelf_id}/books/{book_id}` | 200 Book |
//! | PATCH | `/shelves/{shelf_id}/books/{book_id}` | 200 Book |
//! | DELETE | `/shelves/{shelf_id}/books/{book_id}` | 204 |
//!
//! Handlers validate identifiers and decode input; extractor rejections are
//! caught and turned into [`ApiError`] so every failure leaves as problem
//! details.
//!
//! ```rust,ignore
//! use library_service::{config::Config, handlers, repository::InMemoryStore, state::AppState};
//!
//! let state = AppState::new(Config::default(), &InMemoryStore::new());
//! let app = handlers::router(state);
//! ```

mod books;
mod error;
mod shelves;

#[cfg(test)]
mod tests;

use axum::{
    http::{StatusCode, Uri},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::health::{health, readiness};
use crate::problem::{problem_details, ProblemDetails};
use crate::repository::Storage;
use crate::state::AppState;

pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use shelves::{create_shelf, delete_shelf, get_shelf, list_shelves, update_shelf};

/// Query parameters of create operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateQuery {
    /// Client-chosen identifier; absent or empty generates one
    #[serde(default)]
    pub id: Option<String>,
}

/// Build the API router over `state`
pub fn router<St: Storage>(state: AppState<St>) -> Router {
    Router::new()
        .route("/health", get(health::<St>))
        .route("/ready", get(readiness::<St>))
        .route("/shelves", get(list_shelves::<St>).post(create_shelf::<St>))
        .route(
            "/shelves/{shelf_id}",
            get(get_shelf::<St>)
                .patch(update_shelf::<St>)
                .delete(delete_shelf::<St>),
        )
        .route(
            "/shelves/{shelf_id}/books",
            get(list_books::<St>).post(create_book::<St>),
        )
        .route(
            "/shelves/{shelf_id}/books/{book_id}",
            get(get_book::<St>)
                .patch(update_book::<St>)
                .delete(delete_book::<St>),
        )
        .fallback(not_found)
        .layer(axum::middleware::from_fn(problem_details))
        .with_state(state)
}

async fn not_found(uri: Uri) -> ProblemDetails {
    tracing::debug!(%uri, "No route matched");
    ProblemDetails::from_status(StatusCode::NOT_FOUND)
}
