//! Entity store abstraction and backends
//!
//! - [`EntityStore`]: persistence for one record kind (lookup, insert-if-absent,
//!   atomic update, delete, ordered scan)
//! - [`Storage`]: a backend bundling the shelf and book stores
//! - [`InMemoryStore`]: ordered maps behind async locks, the default backend
//! - `SqliteStore`: SQLite through `sqlx` (feature `sqlite`)
//!
//! # Example
//!
//! ```rust,ignore
//! use library_service::repository::{EntityStore, InMemoryStore, Storage};
//! use library_service::models::ShelfRecord;
//!
//! let store = InMemoryStore::new();
//! store.shelves().insert_if_absent(ShelfRecord::new("SciFi", "Science fiction")).await?;
//! assert!(store.shelves().get("SciFi").await?.is_some());
//! ```

mod error;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

use std::sync::Arc;

use crate::models::{BookRecord, ShelfRecord};

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{InMemoryStore, MemoryTable};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBooks, SqliteShelves, SqliteStore};
pub use traits::{EntityStore, Record, RepositoryResult};

/// A storage backend providing one store per entity kind
pub trait Storage: Send + Sync + 'static {
    type Shelves: EntityStore<ShelfRecord>;
    type Books: EntityStore<BookRecord>;

    fn shelves(&self) -> Arc<Self::Shelves>;
    fn books(&self) -> Arc<Self::Books>;
}
