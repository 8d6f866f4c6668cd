//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (trace context, secure headers, CORS, timeout)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Design Decisions
//! - Trace-context extraction is the outermost layer so every log line
//!   emitted while a request is in flight carries its correlation ids
//! - Unmatched routes go through the same error mapper as handler
//!   failures, so 404s share the JSON body shape

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::db::store::BookStore;
use crate::http::error::ApiError;
use crate::http::middleware::{secure_headers, TraceContextLayer};
use crate::routes;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
}

/// HTTP server for the books API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(settings: &Settings, store: Arc<dyn BookStore>) -> Self {
        let state = AppState { store };
        let router = Self::build_router(settings, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(settings: &Settings, state: AppState) -> Router {
        Router::new()
            .route("/", get(health))
            .nest(&settings.api_v1_prefix, routes::books::router())
            .fallback(fallback)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                settings.request_timeout_secs,
            )))
            .layer(cors_layer(settings))
            .layer(axum::middleware::from_fn(secure_headers))
            .layer(TraceLayer::new_for_http())
            .layer(TraceContextLayer)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router accessor for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Health check route.
async fn health() -> Json<Value> {
    Json(json!({ "message": "ok" }))
}

/// Unmatched routes share the mapped JSON error shape.
async fn fallback() -> ApiError {
    ApiError::http(StatusCode::NOT_FOUND, "Not Found")
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings.all_cors_origins();
    // Credentials are allowed, so a wildcard origin has to be mirrored
    // back instead of sent as `*`.
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| origin.parse().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
