//! HTTP server with graceful shutdown

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    middleware::{request_id_layer, request_id_propagation_layer, sensitive_headers_layer},
    problem::problem_details,
};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the server with the given router until SIGINT or SIGTERM
    pub async fn serve(self, app: Router) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.service.port));

        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        self.log_middleware_config();

        let app = self.apply_layers(app);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    /// Wrap `app` in the configured middleware stack
    ///
    /// Layers added later run first. Error responses produced by the
    /// timeout, body limit and panic layers pass through the problem-details
    /// layer; request IDs are assigned before tracing sees the request.
    pub fn apply_layers(&self, app: Router) -> Router {
        let middleware = &self.config.middleware;
        let tracking = &middleware.request_tracking;
        let body_limit = middleware.body_limit_bytes();

        let mut app = app;

        if middleware.catch_panic {
            app = app.layer(CatchPanicLayer::new());
        }

        // The extractor limit must match or it caps bodies at axum's 2 MB default
        app = app
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(TimeoutLayer::with_status_code(
                http::StatusCode::REQUEST_TIMEOUT,
                self.config.service.timeout(),
            ))
            .layer(axum::middleware::from_fn(problem_details));

        if middleware.compression {
            app = app.layer(CompressionLayer::new());
        }

        app = app.layer(self.build_cors_layer()).layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        );

        if tracking.mask_sensitive_headers {
            app = app.layer(sensitive_headers_layer());
        }
        if tracking.propagate_headers {
            app = app.layer(request_id_propagation_layer());
        }
        if tracking.request_id_enabled {
            app = app.layer(request_id_layer());
        }

        app
    }

    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        let tracking = &middleware.request_tracking;

        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: {}", enabled(middleware.catch_panic));
        tracing::info!(
            "  - Request ID tracking: {}",
            enabled(tracking.request_id_enabled)
        );
        tracing::info!(
            "  - Request ID propagation: {}",
            enabled(tracking.propagate_headers)
        );
        tracing::info!(
            "  - Sensitive header masking: {}",
            enabled(tracking.mask_sensitive_headers)
        );
        tracing::info!("  - Request body limit: {} MB", middleware.body_limit_mb);
        tracing::info!("  - Compression: {}", enabled(middleware.compression));
        tracing::info!("  - CORS mode: {}", middleware.cors_mode);
        tracing::info!(
            "  - Request timeout: {} seconds",
            self.config.service.timeout_secs
        );
        tracing::info!(
            "  - Page size: default {}, max {}",
            self.config.pagination.default_page_size,
            self.config.pagination.max_page_size
        );
    }

    fn build_cors_layer(&self) -> CorsLayer {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                CorsLayer::permissive()
            }
            "restrictive" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                CorsLayer::new()
            }
            "disabled" => {
                tracing::debug!("CORS disabled (using restrictive)");
                CorsLayer::new()
            }
            _ => {
                tracing::warn!(
                    "Unknown CORS mode: {}, defaulting to permissive",
                    self.config.middleware.cors_mode
                );
                CorsLayer::permissive()
            }
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post};
    use http::{header, StatusCode};
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::problem::{ProblemType, PROBLEM_JSON};
    use crate::repository::InMemoryStore;
    use crate::state::AppState;

    fn layered(config: Config) -> Router {
        let app = Router::new().route("/echo", post(|body: String| async move { body }));
        Server::new(config).apply_layers(app)
    }

    fn layered_api(config: Config) -> Router {
        let state = AppState::new(config.clone(), &InMemoryStore::new());
        Server::new(config).apply_layers(router(state))
    }

    /// JSON shelf body of roughly `size` bytes
    fn shelf_body(size: usize) -> Vec<u8> {
        format!(r#"{{"theme":"{}"}}"#, "x".repeat(size)).into_bytes()
    }

    /// Body with no `Content-Length`, delivered in 64 KiB chunks
    fn streamed(bytes: Vec<u8>) -> Body {
        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> =
            bytes.chunks(64 * 1024).map(|chunk| Ok(chunk.to_vec())).collect();
        Body::from_stream(futures::stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = layered(Config::default())
            .oneshot(
                Request::post("/echo")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get("x-request-id").unwrap();
        assert!(id.to_str().unwrap().starts_with("req_"));
    }

    #[tokio::test]
    async fn test_oversized_body_becomes_problem() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 1;
        let body = vec![b'x'; 2 * 1024 * 1024];

        let response = layered(config)
            .oneshot(Request::post("/echo").body(Body::from(body)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_streamed_oversized_create_is_payload_too_large() {
        let response = layered_api(Config::default())
            .oneshot(
                Request::post("/shelves?id=SciFi")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(streamed(shelf_body(2 * 1024 * 1024)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let problem: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(problem["type"], ProblemType::HttpError.as_str());
        assert_eq!(problem["status"], 413);
        assert_eq!(problem["instance"], "/shelves?id=SciFi");
    }

    #[tokio::test]
    async fn test_body_limit_above_extractor_default_is_honoured() {
        let mut config = Config::default();
        config.middleware.body_limit_mb = 4;
        let body = shelf_body(3 * 1024 * 1024);

        let response = layered_api(config)
            .oneshot(
                Request::post("/shelves?id=SciFi")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_request_id_can_be_disabled() {
        let mut config = Config::default();
        config.middleware.request_tracking.request_id_enabled = false;

        let response = layered(config)
            .oneshot(Request::post("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().get("x-request-id").is_none());
    }
}
