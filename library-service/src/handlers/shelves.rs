use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::{ApiError, CreateQuery};
use crate::models::{CreateShelf, ListShelvesResponse, Shelf, ShelfPatch};
use crate::naming::ShelfName;
use crate::pagination::PageRequest;
use crate::repository::Storage;
use crate::responses::{Created, NoContent};
use crate::state::AppState;

/// `GET /shelves`
pub async fn list_shelves<St: Storage>(
    State(state): State<AppState<St>>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<ListShelvesResponse>, ApiError> {
    let Query(request) = query?;
    Ok(Json(state.shelves().list(request).await?))
}

/// `POST /shelves?id=`
pub async fn create_shelf<St: Storage>(
    State(state): State<AppState<St>>,
    query: Result<Query<CreateQuery>, QueryRejection>,
    body: Result<Json<CreateShelf>, JsonRejection>,
) -> Result<Created<Shelf>, ApiError> {
    let Query(query) = query?;
    let Json(body) = body?;

    let shelf = state.shelves().create(query.id.as_deref(), body).await?;
    let location = format!("/{}", shelf.path);
    Ok(Created::new(shelf).with_location(location))
}

/// `GET /shelves/{shelf_id}`
pub async fn get_shelf<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Shelf>, ApiError> {
    let Path(shelf_id) = path?;
    let name = ShelfName::new(&shelf_id)?;
    Ok(Json(state.shelves().get(&name).await?))
}

/// `PATCH /shelves/{shelf_id}`
pub async fn update_shelf<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<ShelfPatch>, JsonRejection>,
) -> Result<Json<Shelf>, ApiError> {
    let Path(shelf_id) = path?;
    let name = ShelfName::new(&shelf_id)?;
    let Json(patch) = body?;
    Ok(Json(state.shelves().update(&name, patch).await?))
}

/// `DELETE /shelves/{shelf_id}`
pub async fn delete_shelf<St: Storage>(
    State(state): State<AppState<St>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<NoContent, ApiError> {
    let Path(shelf_id) = path?;
    let name = ShelfName::new(&shelf_id)?;
    state.shelves().delete(&name).await?;
    Ok(NoContent)
}
