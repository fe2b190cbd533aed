//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::pagination::Paging;
use crate::repository::Storage;
use crate::service::{BookService, ShelfService};

/// Application state shared across handlers
///
/// Generic over the storage backend so the router is built once for the
/// in-memory store and once for SQLite without dynamic dispatch.
pub struct AppState<St: Storage> {
    config: Arc<Config>,
    shelves: ShelfService<St::Shelves>,
    books: BookService<St::Books, St::Shelves>,
}

impl<St: Storage> Clone for AppState<St> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            shelves: self.shelves.clone(),
            books: self.books.clone(),
        }
    }
}

impl<St: Storage> AppState<St> {
    /// Wire the services over `store` using the configured page bounds
    pub fn new(config: Config, store: &St) -> Self {
        let paging = Paging::from(config.pagination);
        Self {
            shelves: ShelfService::new(store.shelves(), paging),
            books: BookService::new(store.books(), store.shelves(), paging),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shelves(&self) -> &ShelfService<St::Shelves> {
        &self.shelves
    }

    pub fn books(&self) -> &BookService<St::Books, St::Shelves> {
        &self.books
    }
}
