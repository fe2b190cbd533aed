//! API error types for handler operations
//!
//! Every failure a handler can hit is an [`ApiError`]: an operation, a kind
//! that fixes the HTTP status, and entity context for logging. Responses are
//! always rendered as [`ProblemDetails`]; internal messages are logged and
//! never sent to the client.
//!
//! # Example
//!
//! ```rust
//! use library_service::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("Shelf", "SciFi");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.message, "Shelf not found");
//! ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::naming::NameError;
use crate::pagination::PageTokenError;
use crate::problem::{ProblemDetails, ProblemType};
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed identifier or page token
    InvalidArgument,
    /// Undecodable query string or body, missing required fields
    ValidationFailed,
    /// Entity or parent absent, or parent/path mismatch
    NotFound,
    /// Entity with the same identifier already exists
    AlreadyExists,
    /// Request body over the configured limit
    PayloadTooLarge,
    /// Store failure
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl ApiErrorKind {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn problem_type(&self) -> ProblemType {
        match self {
            Self::InvalidArgument | Self::ValidationFailed => ProblemType::ValidationError,
            Self::NotFound | Self::AlreadyExists | Self::PayloadTooLarge | Self::Internal => {
                ProblemType::HttpError
            }
        }
    }
}

/// Structured API error with operation context
///
/// ```rust
/// use library_service::handlers::{ApiError, ApiOperation};
///
/// let error = ApiError::not_found("Book", "dune").with_operation(ApiOperation::Delete);
/// assert_eq!(
///     error.to_string(),
///     "API not_found error during delete: Book not found [Book: dune]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub operation: ApiOperation,
    pub kind: ApiErrorKind,
    /// Client-facing summary; becomes the problem title or detail
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// `"{Kind} not found"` with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            operation: ApiOperation::Get,
            kind: ApiErrorKind::NotFound,
            message: format!("{entity_type} not found"),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
        }
    }

    /// The shelf a book operation names does not exist
    pub fn parent_not_found(shelf_id: impl Into<String>) -> Self {
        Self {
            operation: ApiOperation::Get,
            kind: ApiErrorKind::NotFound,
            message: "Parent shelf not found".to_string(),
            entity_type: Some("Shelf".to_string()),
            entity_id: Some(shelf_id.into()),
        }
    }

    /// `"{Kind} already exists"` with entity context
    pub fn already_exists(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            operation: ApiOperation::Create,
            kind: ApiErrorKind::AlreadyExists,
            message: format!("{entity_type} already exists"),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::InvalidArgument, message)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Create, ApiErrorKind::ValidationFailed, message)
    }

    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Problem details for this error, without `instance`
    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.kind.status_code();
        let problem_type = self.kind.problem_type();
        match self.kind {
            ApiErrorKind::InvalidArgument => {
                ProblemDetails::new(problem_type, status, "Invalid Argument")
                    .with_detail(&self.message)
            }
            ApiErrorKind::ValidationFailed => {
                ProblemDetails::new(problem_type, status, "Validation Error")
                    .with_detail(&self.message)
            }
            ApiErrorKind::PayloadTooLarge => ProblemDetails::from_status(status),
            ApiErrorKind::Internal => {
                ProblemDetails::new(problem_type, status, "Internal Server Error")
            }
            ApiErrorKind::NotFound | ApiErrorKind::AlreadyExists => {
                ProblemDetails::new(problem_type, status, &self.message)
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.kind == ApiErrorKind::Internal {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        }

        self.to_problem().into_response()
    }
}

fn repository_operation_to_api_operation(op: RepositoryOperation) -> ApiOperation {
    match op {
        RepositoryOperation::Get | RepositoryOperation::Connect => ApiOperation::Get,
        RepositoryOperation::Insert => ApiOperation::Create,
        RepositoryOperation::Update => ApiOperation::Update,
        RepositoryOperation::Delete => ApiOperation::Delete,
        RepositoryOperation::Scan => ApiOperation::List,
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = repository_operation_to_api_operation(err.operation);
        let entity_type = err.entity_type.clone().unwrap_or_else(|| "Entity".to_string());
        let entity_id = err.entity_id.clone().unwrap_or_default();

        let error = match err.kind {
            RepositoryErrorKind::NotFound => Self::not_found(entity_type, entity_id),
            RepositoryErrorKind::AlreadyExists => Self::already_exists(entity_type, entity_id),
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::DatabaseError => {
                // Store details stay in the log; the client sees a generic title
                tracing::error!(error = %err, "Repository failure");
                Self {
                    operation,
                    kind: ApiErrorKind::Internal,
                    message: "An internal error occurred".to_string(),
                    entity_type: err.entity_type,
                    entity_id: err.entity_id,
                }
            }
        };

        error.with_operation(operation)
    }
}

impl From<NameError> for ApiError {
    fn from(err: NameError) -> Self {
        Self::invalid_argument(err.to_string())
    }
}

impl From<PageTokenError> for ApiError {
    fn from(err: PageTokenError) -> Self {
        Self::invalid_argument(format!("invalid page_token: {err}"))
            .with_operation(ApiOperation::List)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_failed(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Body limits surface as a buffering failure inside the extractor
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(
                ApiOperation::Create,
                ApiErrorKind::PayloadTooLarge,
                rejection.body_text(),
            );
        }
        Self::validation_failed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_argument(rejection.body_text())
    }
}
