//! Entity store trait
//!
//! The store is a key-value collaborator: point lookup, insert-if-absent,
//! atomic read-modify-write, delete, and an ordered range scan. Methods use
//! RPITIT (Return Position Impl Trait In Traits) so implementations can be
//! plain `async fn`s without `async_trait`.
//!
//! # Example
//!
//! ```rust,ignore
//! use library_service::repository::{EntityStore, MemoryTable};
//! use library_service::models::ShelfRecord;
//!
//! let shelves = MemoryTable::<ShelfRecord>::new();
//! shelves.insert_if_absent(ShelfRecord::new("SciFi", "Science fiction")).await?;
//! let first_page = shelves.scan_from(None, None, 11).await?;
//! ```

use std::future::Future;

use super::error::RepositoryError;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A row the store can key, order, and scope by parent
pub trait Record: Clone + Send + Sync + 'static {
    /// Entity type name used in error context, e.g. `"Shelf"`
    const KIND: &'static str;

    /// Unique identifier; rows are totally ordered by it, byte-wise
    fn id(&self) -> &str;

    /// Identifier of the owning parent, for child collections
    fn parent_id(&self) -> Option<&str> {
        None
    }
}

/// Persistence for one record kind, keyed by identifier
///
/// Identifiers are unique across the whole store regardless of parent.
pub trait EntityStore<R: Record>: Send + Sync + 'static {
    /// Look up a record by identifier
    fn get(&self, id: &str) -> impl Future<Output = RepositoryResult<Option<R>>> + Send;

    /// Insert a record unless one with the same identifier exists
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` on an identifier collision; nothing is written.
    fn insert_if_absent(&self, record: R) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Atomically apply `mutate` to the stored record and persist the result
    ///
    /// Returns `Ok(None)` when no record has this identifier. If `mutate`
    /// returns an error, the stored record is left untouched and the error
    /// is passed through.
    fn update<F>(
        &self,
        id: &str,
        mutate: F,
    ) -> impl Future<Output = RepositoryResult<Option<R>>> + Send
    where
        F: FnOnce(&mut R) -> RepositoryResult<()> + Send;

    /// Remove a record; `true` if it existed and was removed
    ///
    /// When `parent` is given the record is only removed if that parent owns
    /// it. The ownership check and the removal are one atomic step.
    fn delete(
        &self,
        id: &str,
        parent: Option<&str>,
    ) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Up to `limit` records with identifier `>= start`, ascending
    ///
    /// When `parent` is given only records owned by that parent are returned.
    /// A `start` of `None` scans from the beginning.
    fn scan_from(
        &self,
        parent: Option<&str>,
        start: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = RepositoryResult<Vec<R>>> + Send;
}
