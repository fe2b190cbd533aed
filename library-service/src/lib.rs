//! # library-service
//!
//! Resource-oriented HTTP API for shelves and the books filed on them.
//!
//! ## Features
//!
//! - **Hierarchical resources**: `shelves/{shelf}` and `shelves/{shelf}/books/{book}`
//!   with list, create, get, partial update and delete
//! - **Cursor pagination**: opaque page tokens, bounded page sizes, no count queries
//! - **Problem details**: every error is `application/problem+json`
//! - **Pluggable storage**: in-memory ordered maps, or SQLite with the `sqlite` feature
//! - **Middleware stack**: request IDs, tracing, timeouts, body limits, panic recovery
//! - **Graceful shutdown**: SIGTERM and SIGINT drain in-flight requests
//!
//! ## Example
//!
//! ```rust,no_run
//! use library_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), &InMemoryStore::new());
//!     Server::new(config).serve(router(state)).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod naming;
pub mod observability;
pub mod pagination;
pub mod problem;
pub mod repository;
pub mod responses;
pub mod server;
pub mod service;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, PaginationConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{router, ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{MakeTypedRequestId, RequestId};
    pub use crate::models::{
        Book, BookPatch, CreateBook, CreateShelf, ListBooksResponse, ListShelvesResponse, Shelf,
        ShelfPatch,
    };
    pub use crate::naming::{BookName, NameError, ShelfName};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{PageRequest, Paging};
    pub use crate::problem::{ProblemDetails, ProblemType};
    pub use crate::repository::{
        EntityStore, InMemoryStore, RepositoryError, RepositoryErrorKind, Storage,
    };
    pub use crate::responses::{Created, NoContent};
    pub use crate::server::Server;
    pub use crate::service::{BookService, ShelfService};
    pub use crate::state::AppState;

    #[cfg(feature = "sqlite")]
    pub use crate::repository::SqliteStore;
}
