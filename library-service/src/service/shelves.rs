use std::sync::Arc;

use crate::handlers::{ApiError, ApiOperation};
use crate::models::{CreateShelf, ListShelvesResponse, Shelf, ShelfPatch, ShelfRecord};
use crate::naming::{resolve_id, ShelfName};
use crate::pagination::{decode_page_token, Page, PageRequest, Paging};
use crate::repository::EntityStore;

/// Operations on the top-level shelf collection
#[derive(Debug)]
pub struct ShelfService<T> {
    shelves: Arc<T>,
    paging: Paging,
}

impl<T> Clone for ShelfService<T> {
    fn clone(&self) -> Self {
        Self {
            shelves: Arc::clone(&self.shelves),
            paging: self.paging,
        }
    }
}

impl<T: EntityStore<ShelfRecord>> ShelfService<T> {
    pub fn new(shelves: Arc<T>, paging: Paging) -> Self {
        Self { shelves, paging }
    }

    /// One page of shelves in identifier order
    pub async fn list(&self, request: PageRequest) -> Result<ListShelvesResponse, ApiError> {
        let start = decode_page_token(request.page_token.as_deref().unwrap_or_default())?;
        let page_size = self.paging.page_size(request.max_page_size);

        let rows = self
            .shelves
            .scan_from(None, start.as_deref(), page_size.saturating_add(1))
            .await?;
        let page = Page::from_lookahead(rows, page_size).map(Shelf::from);

        Ok(ListShelvesResponse {
            shelves: page.items,
            next_page_token: page.next_page_token,
        })
    }

    /// Create a shelf under `requested_id`, or a generated identifier when
    /// none (or the empty string) is given
    pub async fn create(
        &self,
        requested_id: Option<&str>,
        body: CreateShelf,
    ) -> Result<Shelf, ApiError> {
        let id = resolve_id(requested_id)
            .map_err(|err| ApiError::from(err).with_operation(ApiOperation::Create))?;
        let record = ShelfRecord::new(id, body.theme);

        self.shelves.insert_if_absent(record.clone()).await?;
        tracing::info!(shelf_id = %record.id, "Shelf created");
        Ok(record.into())
    }

    pub async fn get(&self, name: &ShelfName) -> Result<Shelf, ApiError> {
        self.shelves
            .get(name.id())
            .await?
            .map(Shelf::from)
            .ok_or_else(|| ApiError::not_found("Shelf", name.id()))
    }

    /// Overwrite the fields present in `patch`; absent fields are kept
    pub async fn update(&self, name: &ShelfName, patch: ShelfPatch) -> Result<Shelf, ApiError> {
        if !patch.has_updates() {
            tracing::debug!(shelf_id = %name.id(), "Empty shelf patch");
        }

        let updated = self
            .shelves
            .update(name.id(), move |record| {
                patch.apply(record);
                Ok(())
            })
            .await?
            .ok_or_else(|| {
                ApiError::not_found("Shelf", name.id()).with_operation(ApiOperation::Update)
            })?;

        tracing::info!(shelf_id = %updated.id, "Shelf updated");
        Ok(updated.into())
    }

    /// Remove a shelf; books filed under it are left in place
    pub async fn delete(&self, name: &ShelfName) -> Result<(), ApiError> {
        if !self.shelves.delete(name.id(), None).await? {
            return Err(
                ApiError::not_found("Shelf", name.id()).with_operation(ApiOperation::Delete)
            );
        }
        tracing::info!(shelf_id = %name.id(), "Shelf deleted");
        Ok(())
    }
}
