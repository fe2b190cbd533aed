use std::sync::Arc;

use crate::handlers::{ApiError, ApiOperation};
use crate::models::{Book, BookPatch, BookRecord, CreateBook, ListBooksResponse, ShelfRecord};
use crate::naming::{resolve_id, BookName, ShelfName};
use crate::pagination::{decode_page_token, Page, PageRequest, Paging};
use crate::repository::{EntityStore, RepositoryError};

/// Operations on the books of a shelf
///
/// Book identifiers are unique across all shelves. A book addressed through
/// a shelf other than the one it was created in is reported as not found.
#[derive(Debug)]
pub struct BookService<B, S> {
    books: Arc<B>,
    shelves: Arc<S>,
    paging: Paging,
}

impl<B, S> Clone for BookService<B, S> {
    fn clone(&self) -> Self {
        Self {
            books: Arc::clone(&self.books),
            shelves: Arc::clone(&self.shelves),
            paging: self.paging,
        }
    }
}

impl<B, S> BookService<B, S>
where
    B: EntityStore<BookRecord>,
    S: EntityStore<ShelfRecord>,
{
    pub fn new(books: Arc<B>, shelves: Arc<S>, paging: Paging) -> Self {
        Self {
            books,
            shelves,
            paging,
        }
    }

    async fn require_shelf(
        &self,
        shelf: &ShelfName,
        operation: ApiOperation,
    ) -> Result<(), ApiError> {
        match self.shelves.get(shelf.id()).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::parent_not_found(shelf.id()).with_operation(operation)),
        }
    }

    /// Stored book at `name`, if it exists under that shelf
    async fn find(&self, name: &BookName) -> Result<Option<BookRecord>, ApiError> {
        Ok(self
            .books
            .get(name.id())
            .await?
            .filter(|record| record.shelf_id == name.shelf_id()))
    }

    /// One page of a shelf's books in identifier order
    pub async fn list(
        &self,
        shelf: &ShelfName,
        request: PageRequest,
    ) -> Result<ListBooksResponse, ApiError> {
        self.require_shelf(shelf, ApiOperation::List).await?;

        let start = decode_page_token(request.page_token.as_deref().unwrap_or_default())?;
        let page_size = self.paging.page_size(request.max_page_size);

        let rows = self
            .books
            .scan_from(Some(shelf.id()), start.as_deref(), page_size.saturating_add(1))
            .await?;
        let page = Page::from_lookahead(rows, page_size).map(Book::from);

        Ok(ListBooksResponse {
            books: page.items,
            next_page_token: page.next_page_token,
        })
    }

    /// Create a book in an existing shelf
    pub async fn create(
        &self,
        shelf: &ShelfName,
        requested_id: Option<&str>,
        body: CreateBook,
    ) -> Result<Book, ApiError> {
        self.require_shelf(shelf, ApiOperation::Create).await?;
        let id = resolve_id(requested_id)
            .map_err(|err| ApiError::from(err).with_operation(ApiOperation::Create))?;

        let record = BookRecord::new(id, shelf.id(), body.title, body.author);
        self.books.insert_if_absent(record.clone()).await?;

        tracing::info!(shelf_id = %record.shelf_id, book_id = %record.id, "Book created");
        Ok(record.into())
    }

    pub async fn get(&self, name: &BookName) -> Result<Book, ApiError> {
        self.find(name)
            .await?
            .map(Book::from)
            .ok_or_else(|| {
                ApiError::not_found("Book", name.id()).with_operation(ApiOperation::Get)
            })
    }

    /// Overwrite the fields present in `patch`; the parent shelf is fixed
    pub async fn update(&self, name: &BookName, patch: BookPatch) -> Result<Book, ApiError> {
        if !patch.has_updates() {
            tracing::debug!(book_id = %name.id(), "Empty book patch");
        }

        let shelf_id = name.shelf_id().to_string();
        let book_id = name.id().to_string();
        let updated = self
            .books
            .update(name.id(), move |record| {
                if record.shelf_id != shelf_id {
                    return Err(RepositoryError::not_found("Book", book_id));
                }
                patch.apply(record);
                Ok(())
            })
            .await?
            .ok_or_else(|| {
                ApiError::not_found("Book", name.id()).with_operation(ApiOperation::Update)
            })?;

        tracing::info!(shelf_id = %updated.shelf_id, book_id = %updated.id, "Book updated");
        Ok(updated.into())
    }

    /// Remove a book; only the shelf it is filed under can delete it
    pub async fn delete(&self, name: &BookName) -> Result<(), ApiError> {
        if !self.books.delete(name.id(), Some(name.shelf_id())).await? {
            return Err(
                ApiError::not_found("Book", name.id()).with_operation(ApiOperation::Delete)
            );
        }

        tracing::info!(shelf_id = %name.shelf_id(), book_id = %name.id(), "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::ApiErrorKind;
    use crate::repository::{MemoryTable, RepositoryResult};

    type Service = BookService<MemoryTable<BookRecord>, MemoryTable<ShelfRecord>>;

    /// Book table whose lookups report every book under `SciFi`, as a reader
    /// would see it just before a concurrent re-file under another shelf
    struct StaleShelfReads {
        inner: MemoryTable<BookRecord>,
    }

    impl EntityStore<BookRecord> for StaleShelfReads {
        async fn get(&self, id: &str) -> RepositoryResult<Option<BookRecord>> {
            Ok(self.inner.get(id).await?.map(|mut record| {
                record.shelf_id = "SciFi".to_string();
                record
            }))
        }

        async fn insert_if_absent(&self, record: BookRecord) -> RepositoryResult<()> {
            self.inner.insert_if_absent(record).await
        }

        async fn update<F>(&self, id: &str, mutate: F) -> RepositoryResult<Option<BookRecord>>
        where
            F: FnOnce(&mut BookRecord) -> RepositoryResult<()> + Send,
        {
            self.inner.update(id, mutate).await
        }

        async fn delete(&self, id: &str, parent: Option<&str>) -> RepositoryResult<bool> {
            self.inner.delete(id, parent).await
        }

        async fn scan_from(
            &self,
            parent: Option<&str>,
            start: Option<&str>,
            limit: usize,
        ) -> RepositoryResult<Vec<BookRecord>> {
            self.inner.scan_from(parent, start, limit).await
        }
    }

    async fn service_with_shelves(shelves: &[&str]) -> Service {
        let shelf_table: MemoryTable<ShelfRecord> = MemoryTable::new();
        for id in shelves {
            shelf_table
                .insert_if_absent(ShelfRecord::new(*id, "t"))
                .await
                .unwrap();
        }
        BookService::new(
            Arc::new(MemoryTable::new()),
            Arc::new(shelf_table),
            Paging::new(10, 100),
        )
    }

    fn body(title: &str, author: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    fn shelf(id: &str) -> ShelfName {
        ShelfName::new(id).unwrap()
    }

    fn book(shelf: &str, id: &str) -> BookName {
        BookName::new(shelf, id).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service_with_shelves(&["SciFi"]).await;
        let created = service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Frank Herbert"))
            .await
            .unwrap();
        assert_eq!(created.path, "shelves/SciFi/books/dune");

        let fetched = service.get(&book("SciFi", "dune")).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_in_missing_shelf() {
        let service = service_with_shelves(&[]).await;
        let err = service
            .create(&shelf("Poetry"), Some("odes"), body("Odes", "Keats"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Parent shelf not found");
        assert_eq!(err.operation, ApiOperation::Create);
    }

    #[tokio::test]
    async fn test_book_ids_are_unique_across_shelves() {
        let service = service_with_shelves(&["SciFi", "Classics"]).await;
        service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Herbert"))
            .await
            .unwrap();

        let err = service
            .create(&shelf("Classics"), Some("dune"), body("Other", "Someone"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::AlreadyExists);
        assert_eq!(err.message, "Book already exists");
    }

    #[tokio::test]
    async fn test_wrong_parent_is_not_found() {
        let service = service_with_shelves(&["SciFi", "Classics"]).await;
        service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Herbert"))
            .await
            .unwrap();
        let elsewhere = book("Classics", "dune");

        assert_eq!(
            service.get(&elsewhere).await.unwrap_err().kind,
            ApiErrorKind::NotFound
        );

        let patch = BookPatch {
            title: Some("Stolen".to_string()),
            author: None,
        };
        assert_eq!(
            service.update(&elsewhere, patch).await.unwrap_err().kind,
            ApiErrorKind::NotFound
        );
        assert_eq!(
            service.delete(&elsewhere).await.unwrap_err().kind,
            ApiErrorKind::NotFound
        );

        let untouched = service.get(&book("SciFi", "dune")).await.unwrap();
        assert_eq!(untouched.title, "Dune");
    }

    #[tokio::test]
    async fn test_delete_does_not_trust_earlier_lookup() {
        let shelves: MemoryTable<ShelfRecord> = MemoryTable::new();
        for id in ["SciFi", "Classics"] {
            shelves
                .insert_if_absent(ShelfRecord::new(id, "t"))
                .await
                .unwrap();
        }
        let books = StaleShelfReads {
            inner: MemoryTable::new(),
        };
        books
            .insert_if_absent(BookRecord::new("dune", "Classics", "Dune", "Herbert"))
            .await
            .unwrap();
        let service = BookService::new(
            Arc::new(books),
            Arc::new(shelves),
            Paging::new(10, 100),
        );

        let err = service.delete(&book("SciFi", "dune")).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.operation, ApiOperation::Delete);

        let stored = service.books.inner.get("dune").await.unwrap().unwrap();
        assert_eq!(stored.shelf_id, "Classics");
    }

    #[tokio::test]
    async fn test_not_found_errors_name_their_operation() {
        let service = service_with_shelves(&["SciFi"]).await;
        let name = book("SciFi", "ghost");

        assert_eq!(
            service.get(&name).await.unwrap_err().operation,
            ApiOperation::Get
        );
        let patch = BookPatch {
            title: Some("x".to_string()),
            author: None,
        };
        assert_eq!(
            service.update(&name, patch).await.unwrap_err().operation,
            ApiOperation::Update
        );
    }

    #[tokio::test]
    async fn test_partial_updates_are_isolated() {
        let service = service_with_shelves(&["SciFi"]).await;
        service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Herbert"))
            .await
            .unwrap();
        let name = book("SciFi", "dune");

        let updated = service
            .update(
                &name,
                BookPatch {
                    title: Some("Dune Messiah".to_string()),
                    author: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.author, "Herbert");

        let updated = service
            .update(
                &name,
                BookPatch {
                    title: None,
                    author: Some("Frank Herbert".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.author, "Frank Herbert");
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let service = service_with_shelves(&["SciFi"]).await;
        service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Herbert"))
            .await
            .unwrap();
        let name = book("SciFi", "dune");

        service.delete(&name).await.unwrap();
        assert_eq!(service.get(&name).await.unwrap_err().kind, ApiErrorKind::NotFound);
        assert_eq!(
            service.delete(&name).await.unwrap_err().kind,
            ApiErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_shelf() {
        let service = service_with_shelves(&["SciFi", "Classics"]).await;
        let books = [("SciFi", "b"), ("Classics", "a"), ("SciFi", "c"), ("SciFi", "a2")];
        for (shelf_id, id) in books {
            service
                .create(&shelf(shelf_id), Some(id), body(id, "x"))
                .await
                .unwrap();
        }

        let page = service
            .list(&shelf("SciFi"), PageRequest::default())
            .await
            .unwrap();
        let paths: Vec<_> = page.books.iter().map(|b| b.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "shelves/SciFi/books/a2",
                "shelves/SciFi/books/b",
                "shelves/SciFi/books/c"
            ]
        );
        assert!(page.next_page_token.is_empty());
    }

    #[tokio::test]
    async fn test_list_pages_single_book() {
        let service = service_with_shelves(&["SciFi"]).await;
        service
            .create(&shelf("SciFi"), Some("dune"), body("Dune", "Herbert"))
            .await
            .unwrap();

        let page = service
            .list(&shelf("SciFi"), PageRequest::default().with_page_size(1))
            .await
            .unwrap();
        assert_eq!(page.books.len(), 1);
        assert_eq!(page.next_page_token, "");
    }

    #[tokio::test]
    async fn test_list_missing_shelf() {
        let service = service_with_shelves(&[]).await;
        let err = service
            .list(&shelf("Poetry"), PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Parent shelf not found");
    }
}
