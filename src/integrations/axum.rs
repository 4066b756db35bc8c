//! Axum framework integration.
//!
//! This module provides a ready-made [`router`] that serves the conversion
//! endpoint plus health and readiness probes, and [`IntoResponse`] impls for
//! the service's response and error types.
//!
//! # Setup
//!
//! ```toml
//! [dependencies]
//! html2pdf-gateway = { version = "0.1", features = ["axum-integration"] }
//! axum = "0.8"
//! ```
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/pdf/generate` | Convert fragments to PDF |
//! | POST | `/api/Pdf/Generate` | Same, for existing clients |
//! | GET | `/health` | Liveness |
//! | GET | `/ready` | Engine readiness |
//!
//! # Basic Usage
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//! use html2pdf_gateway::integrations::axum::router;
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = init_engine_manager().expect("Failed to create engine manager");
//!     manager.spawn_warm();
//!
//!     let service = PdfService::with_env_api_key(manager.clone()).into_shared();
//!     let app = router(service);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     axum::serve(listener, app)
//!         .with_graceful_shutdown(async { tokio::signal::ctrl_c().await.ok(); })
//!         .await
//!         .unwrap();
//!
//!     manager.shutdown().await;
//! }
//! ```
//!
//! # Custom Handlers
//!
//! Mount [`generate_pdf`] under your own path, or call
//! [`PdfService::handle`](crate::service::PdfService::handle) yourself and
//! return its result; both [`PdfResponse`] and [`PdfServiceError`] implement
//! [`IntoResponse`].

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};

use crate::auth::API_KEY_HEADER;
use crate::config::DEFAULT_BODY_LIMIT_BYTES;
use crate::service::{PdfEnvelope, PdfResponse, PdfServiceError, SharedPdfService};

/// Canonical conversion route.
pub const GENERATE_PATH: &str = "/api/pdf/generate";

/// PascalCase alias of [`GENERATE_PATH`].
pub const GENERATE_PATH_LEGACY: &str = "/api/Pdf/Generate";

/// Axum `State` extractor for the shared service.
pub type PdfServiceState = State<SharedPdfService>;

/// Router with every route and the default body limit.
pub fn router(service: SharedPdfService) -> Router {
    router_with_body_limit(service, DEFAULT_BODY_LIMIT_BYTES)
}

/// Router with every route and a custom body limit in bytes.
pub fn router_with_body_limit(service: SharedPdfService, body_limit: usize) -> Router {
    Router::new()
        .route(GENERATE_PATH, post(generate_pdf))
        .route(GENERATE_PATH_LEGACY, post(generate_pdf))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Convert fragments to a PDF.
///
/// Takes the raw body so the API key is checked before any JSON parsing.
/// A body refused by the size limit is reported only after the key check,
/// so unauthorized callers always get 401.
pub async fn generate_pdf(
    State(service): PdfServiceState,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return service
                .reject_body(api_key, rejection.status().as_u16(), &rejection.body_text())
                .into_response();
        }
    };

    match service.handle(api_key, &body).await {
        Ok(pdf) => pdf.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Liveness probe. Never touches the engine.
pub async fn health_check(State(service): PdfServiceState) -> Response {
    Json(service.health()).into_response()
}

/// Readiness probe: 503 while the engine is launching, 200 otherwise.
pub async fn readiness_check(State(service): PdfServiceState) -> Response {
    let status = service.engine_status();
    let code = if status.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

impl IntoResponse for PdfResponse {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.data,
        )
            .into_response()
    }
}

impl IntoResponse for PdfEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for PdfServiceError {
    fn into_response(self) -> Response {
        PdfEnvelope::from_error(&self).into_response()
    }
}
