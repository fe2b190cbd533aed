//! HTTP response builders for success statuses
//!
//! - **201 Created**: resource created, with a `Location` header
//! - **204 No Content**: successful delete
//!
//! Error responses go through [`crate::handlers::ApiError`] instead.
//!
//! ```rust,ignore
//! use library_service::responses::{Created, NoContent};
//!
//! async fn create_shelf() -> Created<Shelf> {
//!     Created::new(shelf).with_location("/shelves/SciFi")
//! }
//!
//! async fn delete_shelf() -> NoContent {
//!     NoContent
//! }
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// ============================================================================
// 201 Created
// ============================================================================

/// HTTP 201 Created response
///
/// Optionally includes a `Location` header pointing to the new resource.
#[derive(Debug)]
pub struct Created<T> {
    data: T,
    location: Option<String>,
}

impl<T> Created<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            location: None,
        }
    }

    /// Add a Location header pointing to the created resource
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(&self.data)).into_response();

        if let Some(location) = self.location {
            if let Ok(header_value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, header_value);
            }
        }

        response
    }
}

// ============================================================================
// 204 No Content
// ============================================================================

/// HTTP 204 No Content response
#[derive(Debug, Clone, Copy)]
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Thing {
        path: String,
    }

    #[tokio::test]
    async fn test_created_response() {
        let response = Created::new(Thing {
            path: "shelves/SciFi".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::LOCATION).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["path"], "shelves/SciFi");
    }

    #[test]
    fn test_created_with_location() {
        let response = Created::new(Thing {
            path: "shelves/SciFi".to_string(),
        })
        .with_location("/shelves/SciFi")
        .into_response();

        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/shelves/SciFi"
        );
    }

    #[test]
    fn test_no_content_response() {
        let response = NoContent.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
