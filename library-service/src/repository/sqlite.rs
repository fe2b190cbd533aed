//! SQLite-backed entity store
//!
//! Tables are created on connect if they do not exist. Identifiers are
//! `TEXT PRIMARY KEY` columns compared with SQLite's default BINARY
//! collation, which gives the same byte-wise order as the in-memory store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{EntityStore, Record, RepositoryResult};
use super::Storage;
use crate::config::DatabaseConfig;
use crate::models::{BookRecord, ShelfRecord};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS shelves (
        id TEXT PRIMARY KEY NOT NULL,
        theme TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY NOT NULL,
        shelf_id TEXT NOT NULL,
        title TEXT NOT NULL,
        author TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS books_by_shelf ON books (shelf_id, id)",
];

fn db_error(operation: RepositoryOperation) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |err| RepositoryError::from(err).with_operation(operation)
}

fn scan_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Shelves and books persisted in one SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    shelves: Arc<SqliteShelves>,
    books: Arc<SqliteBooks>,
}

impl SqliteStore {
    /// Open the database named by `config.url`, creating file and schema as needed
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(db_error(RepositoryOperation::Connect))?
            .create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so pin one
        let in_memory = config.url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { config.max_connections })
            .acquire_timeout(config.connection_timeout());
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|err| RepositoryError::connection_failed(err.to_string()))?;

        tracing::info!(
            max_connections = config.max_connections,
            in_memory,
            "SQLite connection pool created"
        );

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if it is missing
    pub async fn from_pool(pool: SqlitePool) -> RepositoryResult<Self> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(db_error(RepositoryOperation::Connect))?;
        }

        Ok(Self {
            shelves: Arc::new(SqliteShelves { pool: pool.clone() }),
            books: Arc::new(SqliteBooks { pool }),
        })
    }
}

impl Storage for SqliteStore {
    type Shelves = SqliteShelves;
    type Books = SqliteBooks;

    fn shelves(&self) -> Arc<Self::Shelves> {
        Arc::clone(&self.shelves)
    }

    fn books(&self) -> Arc<Self::Books> {
        Arc::clone(&self.books)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteShelves {
    pool: SqlitePool,
}

impl EntityStore<ShelfRecord> for SqliteShelves {
    async fn get(&self, id: &str) -> RepositoryResult<Option<ShelfRecord>> {
        sqlx::query_as("SELECT id, theme FROM shelves WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Get))
    }

    async fn insert_if_absent(&self, record: ShelfRecord) -> RepositoryResult<()> {
        let inserted = sqlx::query(
            "INSERT INTO shelves (id, theme) VALUES (?, ?) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&record.id)
        .bind(&record.theme)
        .execute(&self.pool)
        .await
        .map_err(db_error(RepositoryOperation::Insert))?
        .rows_affected();

        if inserted == 0 {
            return Err(RepositoryError::already_exists(ShelfRecord::KIND, record.id));
        }
        Ok(())
    }

    async fn update<F>(&self, id: &str, mutate: F) -> RepositoryResult<Option<ShelfRecord>>
    where
        F: FnOnce(&mut ShelfRecord) -> RepositoryResult<()> + Send,
    {
        let on_err = db_error(RepositoryOperation::Update);
        let mut tx = self.pool.begin().await.map_err(&on_err)?;

        let stored: Option<ShelfRecord> =
            sqlx::query_as("SELECT id, theme FROM shelves WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(&on_err)?;
        let Some(mut record) = stored else {
            return Ok(None);
        };

        mutate(&mut record).map_err(|err| err.with_operation(RepositoryOperation::Update))?;

        sqlx::query("UPDATE shelves SET theme = ? WHERE id = ?")
            .bind(&record.theme)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(&on_err)?;
        tx.commit().await.map_err(&on_err)?;

        Ok(Some(record))
    }

    async fn delete(&self, id: &str, parent: Option<&str>) -> RepositoryResult<bool> {
        if parent.is_some() {
            return Ok(false);
        }

        let deleted = sqlx::query("DELETE FROM shelves WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Delete))?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn scan_from(
        &self,
        parent: Option<&str>,
        start: Option<&str>,
        limit: usize,
    ) -> RepositoryResult<Vec<ShelfRecord>> {
        // Shelves are top-level; nothing is owned by a parent
        if parent.is_some() {
            return Ok(Vec::new());
        }

        sqlx::query_as("SELECT id, theme FROM shelves WHERE id >= ? ORDER BY id LIMIT ?")
            .bind(start.unwrap_or(""))
            .bind(scan_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Scan))
    }
}

#[derive(Debug, Clone)]
pub struct SqliteBooks {
    pool: SqlitePool,
}

impl EntityStore<BookRecord> for SqliteBooks {
    async fn get(&self, id: &str) -> RepositoryResult<Option<BookRecord>> {
        sqlx::query_as("SELECT id, shelf_id, title, author FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Get))
    }

    async fn insert_if_absent(&self, record: BookRecord) -> RepositoryResult<()> {
        let inserted = sqlx::query(
            "INSERT INTO books (id, shelf_id, title, author) VALUES (?, ?, ?, ?) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&record.id)
        .bind(&record.shelf_id)
        .bind(&record.title)
        .bind(&record.author)
        .execute(&self.pool)
        .await
        .map_err(db_error(RepositoryOperation::Insert))?
        .rows_affected();

        if inserted == 0 {
            return Err(RepositoryError::already_exists(BookRecord::KIND, record.id));
        }
        Ok(())
    }

    async fn update<F>(&self, id: &str, mutate: F) -> RepositoryResult<Option<BookRecord>>
    where
        F: FnOnce(&mut BookRecord) -> RepositoryResult<()> + Send,
    {
        let on_err = db_error(RepositoryOperation::Update);
        let mut tx = self.pool.begin().await.map_err(&on_err)?;

        let stored: Option<BookRecord> =
            sqlx::query_as("SELECT id, shelf_id, title, author FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(&on_err)?;
        let Some(mut record) = stored else {
            return Ok(None);
        };

        mutate(&mut record).map_err(|err| err.with_operation(RepositoryOperation::Update))?;

        sqlx::query("UPDATE books SET title = ?, author = ? WHERE id = ?")
            .bind(&record.title)
            .bind(&record.author)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(&on_err)?;
        tx.commit().await.map_err(&on_err)?;

        Ok(Some(record))
    }

    async fn delete(&self, id: &str, parent: Option<&str>) -> RepositoryResult<bool> {
        let query = match parent {
            Some(shelf_id) => sqlx::query("DELETE FROM books WHERE id = ? AND shelf_id = ?")
                .bind(id)
                .bind(shelf_id),
            None => sqlx::query("DELETE FROM books WHERE id = ?").bind(id),
        };

        let deleted = query
            .execute(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Delete))?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn scan_from(
        &self,
        parent: Option<&str>,
        start: Option<&str>,
        limit: usize,
    ) -> RepositoryResult<Vec<BookRecord>> {
        let start = start.unwrap_or("");
        let query = match parent {
            Some(shelf_id) => sqlx::query_as::<_, BookRecord>(
                "SELECT id, shelf_id, title, author FROM books \
                 WHERE shelf_id = ? AND id >= ? ORDER BY id LIMIT ?",
            )
            .bind(shelf_id),
            None => sqlx::query_as::<_, BookRecord>(
                "SELECT id, shelf_id, title, author FROM books WHERE id >= ? ORDER BY id LIMIT ?",
            ),
        };

        query
            .bind(start)
            .bind(scan_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(RepositoryOperation::Scan))
    }
}
