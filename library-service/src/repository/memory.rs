//! In-memory entity store
//!
//! Each table is an ordered map behind a `tokio::sync::RwLock`, so a range
//! scan walks identifiers in byte order and every mutation is a single
//! write-lock critical section.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{EntityStore, Record, RepositoryResult};
use super::Storage;
use crate::models::{BookRecord, ShelfRecord};

/// One record kind, keyed and ordered by identifier
#[derive(Debug)]
pub struct MemoryTable<R> {
    rows: RwLock<BTreeMap<String, R>>,
}

impl<R> MemoryTable<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<R> Default for MemoryTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> EntityStore<R> for MemoryTable<R> {
    async fn get(&self, id: &str) -> RepositoryResult<Option<R>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn insert_if_absent(&self, record: R) -> RepositoryResult<()> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(record.id()) {
            return Err(RepositoryError::already_exists(R::KIND, record.id()));
        }
        rows.insert(record.id().to_string(), record);
        Ok(())
    }

    async fn update<F>(&self, id: &str, mutate: F) -> RepositoryResult<Option<R>>
    where
        F: FnOnce(&mut R) -> RepositoryResult<()> + Send,
    {
        let mut rows = self.rows.write().await;
        let Some(stored) = rows.get_mut(id) else {
            return Ok(None);
        };

        // Mutate a copy so a rejected update leaves the row untouched
        let mut next = stored.clone();
        mutate(&mut next).map_err(|err| err.with_operation(RepositoryOperation::Update))?;
        *stored = next.clone();
        Ok(Some(next))
    }

    async fn delete(&self, id: &str, parent: Option<&str>) -> RepositoryResult<bool> {
        let mut rows = self.rows.write().await;
        let owned = rows
            .get(id)
            .is_some_and(|record| parent.is_none() || record.parent_id() == parent);
        if !owned {
            return Ok(false);
        }
        Ok(rows.remove(id).is_some())
    }

    async fn scan_from(
        &self,
        parent: Option<&str>,
        start: Option<&str>,
        limit: usize,
    ) -> RepositoryResult<Vec<R>> {
        let rows = self.rows.read().await;
        let lower = start.map_or(Bound::Unbounded, Bound::Included);

        Ok(rows
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(_, record)| record)
            .filter(|record| parent.is_none() || record.parent_id() == parent)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Shelves and books held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shelves: Arc<MemoryTable<ShelfRecord>>,
    books: Arc<MemoryTable<BookRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStore {
    type Shelves = MemoryTable<ShelfRecord>;
    type Books = MemoryTable<BookRecord>;

    fn shelves(&self) -> Arc<Self::Shelves> {
        Arc::clone(&self.shelves)
    }

    fn books(&self) -> Arc<Self::Books> {
        Arc::clone(&self.books)
    }
}
