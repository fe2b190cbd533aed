//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::pagination::PageRequest;
use crate::problem::{ProblemDetails, ProblemType};
use crate::repository::Storage;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub service: String,
}

/// Simple health check (liveness probe)
///
/// Always returns 200 OK if the service is running.
pub async fn health<St: Storage>(State(state): State<AppState<St>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check (readiness probe)
///
/// Reads one shelf to prove the store answers. Returns 503 problem details
/// when it does not.
pub async fn readiness<St: Storage>(
    State(state): State<AppState<St>>,
) -> Result<impl IntoResponse, ProblemDetails> {
    let probe = PageRequest::default().with_page_size(1);
    if let Err(err) = state.shelves().list(probe).await {
        tracing::warn!(error = %err, "Readiness probe failed");
        return Err(ProblemDetails::new(
            ProblemType::HttpError,
            StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable",
        )
        .with_detail("storage is not responding"));
    }

    Ok(Json(ReadinessResponse {
        ready: true,
        service: state.config().service.name.clone(),
    }))
}
