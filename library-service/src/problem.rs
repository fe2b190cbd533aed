//! Problem details (RFC 7807) error envelope
//!
//! Every error response leaves the service as `application/problem+json`:
//!
//! ```json
//! {
//!   "type": "aep.example.com/http-error",
//!   "title": "Shelf not found",
//!   "status": 404,
//!   "instance": "/shelves/SciFi"
//! }
//! ```
//!
//! Handlers produce a [`ProblemDetails`] through [`crate::handlers::ApiError`].
//! The [`problem_details`] middleware stamps `instance` with the request URI
//! and rewrites any other error response (unknown route, 405, timeout,
//! oversized body) into the same envelope.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Media type of every error body
pub const PROBLEM_JSON: &str = "application/problem+json";

/// Stable `type` URIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemType {
    /// Generic HTTP failure: not found, conflict, internal, routing
    #[serde(rename = "aep.example.com/http-error")]
    HttpError,
    /// The request itself was malformed
    #[serde(rename = "aep.example.com/validation-error")]
    ValidationError,
}

impl ProblemType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HttpError => "aep.example.com/http-error",
            Self::ValidationError => "aep.example.com/validation-error",
        }
    }
}

/// Uniform error payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: ProblemType,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ProblemDetails {
    pub fn new(problem_type: ProblemType, status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            problem_type,
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
        }
    }

    /// Generic problem for a bare status, titled with its reason phrase
    pub fn from_status(status: StatusCode) -> Self {
        let title = status.canonical_reason().unwrap_or("Error");
        Self::new(ProblemType::HttpError, status, title)
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Replace the body of `response` with this problem, keeping its other headers
    fn render_over(&self, response: Response) -> Response {
        let body = match serde_json::to_vec(self) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize problem details");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let (mut parts, _) = response.into_parts();
        parts.status = self.status_code();
        parts.headers.remove(header::CONTENT_LENGTH);
        parts.headers.remove(header::CONTENT_ENCODING);
        parts
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));
        Response::from_parts(parts, Body::from(body))
    }
}

/// Marker left on a response whose problem still needs its `instance`
#[derive(Debug, Clone)]
struct PendingProblem(ProblemDetails);

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let mut response = self.render_over(Response::default());
        response.extensions_mut().insert(PendingProblem(self));
        response
    }
}

fn is_problem(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(PROBLEM_JSON.as_bytes()))
}

/// Middleware that finalizes every error response as problem details
///
/// Problems raised by handlers get `instance` set to the request URI.
/// Error responses produced elsewhere (routing, extractors, timeouts) are
/// rewritten into an `http-error` problem titled with the status reason.
/// Applying the layer twice is harmless: finalized problems pass through.
pub async fn problem_details(request: Request, next: Next) -> Response {
    let instance = request.uri().to_string();
    let mut response = next.run(request).await;

    if let Some(PendingProblem(problem)) = response.extensions_mut().remove::<PendingProblem>() {
        return problem.with_instance(instance).render_over(response);
    }

    let status = response.status();
    if (status.is_client_error() || status.is_server_error()) && !is_problem(&response) {
        tracing::debug!(
            status = status.as_u16(),
            %instance,
            "Rewriting error response as problem details"
        );
        return ProblemDetails::from_status(status)
            .with_instance(instance)
            .render_over(response);
    }

    response
}
