use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::{ApiError, CreateQuery};
use crate::models::{Book, BookPatch, CreateBook, ListBooksResponse};
use crate::naming::{BookName, ShelfName};
use crate::pagination::PageRequest;
use crate::repository::Storage;
use crate::responses::{Created, NoContent};
use crate::state::AppState;

/// `GET /shelves/{shelf_id}/books`
pub async fn list_books<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<ListBooksResponse>, ApiError> {
    let Path(shelf_id) = path?;
    let shelf = ShelfName::new(&shelf_id)?;
    let Query(request) = query?;
    Ok(Json(state.books().list(&shelf, request).await?))
}

/// `POST /shelves/{shelf_id}/books?id=`
pub async fn create_book<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<CreateQuery>, QueryRejection>,
    body: Result<Json<CreateBook>, JsonRejection>,
) -> Result<Created<Book>, ApiError> {
    let Path(shelf_id) = path?;
    let shelf = ShelfName::new(&shelf_id)?;
    let Query(query) = query?;
    let Json(body) = body?;

    let book = state
        .books()
        .create(&shelf, query.id.as_deref(), body)
        .await?;
    let location = format!("/{}", book.path);
    Ok(Created::new(book).with_location(location))
}

/// `GET /shelves/{shelf_id}/books/{book_id}`
pub async fn get_book<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<Book>, ApiError> {
    let Path((shelf_id, book_id)) = path?;
    let name = BookName::new(&shelf_id, &book_id)?;
    Ok(Json(state.books().get(&name).await?))
}

/// `PATCH /shelves/{shelf_id}/books/{book_id}`
pub async fn update_book<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<(String, String)>, PathRejection>,
    body: Result<Json<BookPatch>, JsonRejection>,
) -> Result<Json<Book>, ApiError> {
    let Path((shelf_id, book_id)) = path?;
    let name = BookName::new(&shelf_id, &book_id)?;
    let Json(patch) = body?;
    Ok(Json(state.books().update(&name, patch).await?))
}

/// `DELETE /shelves/{shelf_id}/books/{book_id}`
pub async fn delete_book<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<NoContent, ApiError> {
    let Path((shelf_id, book_id)) = path?;
    let name = BookName::new(&shelf_id, &book_id)?;
    state.books().delete(&name).await?;
    Ok(NoContent)
}
