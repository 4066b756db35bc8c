//! Actix-web framework integration.
//!
//! This module provides pre-built handlers and [`configure_routes`] for
//! serving the gateway from an Actix-web application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use actix_web::{App, HttpServer, web};
//! use html2pdf_gateway::prelude::*;
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let manager = init_engine_manager().expect("Failed to create engine manager");
//!     manager.spawn_warm();
//!
//!     let service = PdfService::with_env_api_key(manager.clone()).into_shared();
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .app_data(web::Data::new(service.clone()))
//!             .configure(html2pdf_gateway::integrations::actix::configure_routes)
//!     })
//!     .bind("127.0.0.1:8080")?
//!     .run()
//!     .await?;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! This gives you the following endpoints:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/api/pdf/generate` | Convert fragments to PDF |
//! | POST | `/api/Pdf/Generate` | Same, for existing clients |
//! | GET | `/health` | Liveness |
//! | GET | `/ready` | Engine readiness |

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, http::header, web};

use crate::auth::API_KEY_HEADER;
use crate::config::DEFAULT_BODY_LIMIT_BYTES;
use crate::service::{PdfEnvelope, PdfResponse, PdfServiceError, SharedPdfService};

/// Actix-web `Data` wrapper around the shared service.
pub type PdfServiceData = web::Data<SharedPdfService>;

// ============================================================================
// Pre-built Handlers
// ============================================================================

/// Convert fragments to a PDF.
///
/// # Endpoint
///
/// ```text
/// POST /api/pdf/generate
/// X-Pdf-Api-Key: <secret>
/// Content-Type: application/json
///
/// { "htmlData": ["PGgxPkhlbGxvPC9oMT4="], "fileName": "hello.pdf" }
/// ```
///
/// Takes the raw body so the API key is checked before any JSON parsing.
/// A body refused by the payload limit is reported only after the key
/// check, so unauthorized callers always get 401.
pub async fn generate_pdf(
    service: PdfServiceData,
    req: HttpRequest,
    body: Result<web::Bytes, actix_web::Error>,
) -> HttpResponse {
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            let status = e.as_response_error().status_code().as_u16();
            return build_error_response(&service.reject_body(api_key, status, &e.to_string()));
        }
    };

    match service.handle(api_key, &body).await {
        Ok(pdf) => build_pdf_response(pdf),
        Err(e) => build_error_response(&e),
    }
}

/// Liveness probe. Never touches the engine.
pub async fn health_check(service: PdfServiceData) -> HttpResponse {
    HttpResponse::Ok().json(service.health())
}

/// Readiness probe: 503 while the engine is launching, 200 otherwise.
pub async fn readiness_check(service: PdfServiceData) -> HttpResponse {
    let status = service.engine_status();
    if status.ready {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}

/// Register every route with the default body limit.
///
/// Expects a [`PdfServiceData`] in the app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    configure_routes_with_limit(DEFAULT_BODY_LIMIT_BYTES)(cfg)
}

/// Register every route with a custom body limit in bytes.
///
/// ```rust,ignore
/// App::new()
///     .app_data(web::Data::new(service.clone()))
///     .configure(configure_routes_with_limit(8 * 1024 * 1024))
/// ```
pub fn configure_routes_with_limit(body_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::PayloadConfig::new(body_limit))
            .route("/api/pdf/generate", web::post().to(generate_pdf))
            .route("/api/Pdf/Generate", web::post().to(generate_pdf))
            .route("/health", web::get().to(health_check))
            .route("/ready", web::get().to(readiness_check));
    }
}

// ============================================================================
// Response Builders (Internal)
// ============================================================================

fn build_pdf_response(response: PdfResponse) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header((header::CONTENT_DISPOSITION, response.content_disposition()))
        .body(response.data)
}

fn build_error_response(error: &PdfServiceError) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(PdfEnvelope::from_error(error))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, test};

    use crate::config::StaticApiKey;
    use crate::engine::mock::MockEngineLauncher;
    use crate::manager::RenderEngineManager;
    use crate::service::PdfService;

    const KEY: &str = "actix-test-key";

    fn service() -> SharedPdfService {
        let manager = RenderEngineManager::builder()
            .launcher(Box::new(MockEngineLauncher::new()))
            .build()
            .unwrap()
            .into_shared();
        PdfService::new(manager, Arc::new(StaticApiKey::new(KEY))).into_shared()
    }

    #[::core::prelude::v1::test]
    fn test_type_alias_compiles() {
        fn _accepts_service_data(_: PdfServiceData) {}
    }

    #[actix_web::test]
    async fn test_generate_returns_pdf() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/Pdf/Generate")
            .insert_header((API_KEY_HEADER, KEY))
            .set_payload(r#"{"htmlData":["PGgxPkhlbGxvPC9oMT4="]}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"document.pdf\""
        );
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn test_missing_key_is_401_envelope() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pdf/generate")
            .set_payload("{}")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_oversized_body_without_key_is_401() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(configure_routes_with_limit(64)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pdf/generate")
            .set_payload("A".repeat(256))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["statusCode"], 401);
    }

    #[actix_web::test]
    async fn test_oversized_body_with_key_is_413_envelope() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(configure_routes_with_limit(64)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pdf/generate")
            .insert_header((API_KEY_HEADER, KEY))
            .set_payload("A".repeat(256))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["statusCode"], 413);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_health_and_ready() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service()))
                .configure(configure_routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ready").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["state"], "uninitialized");
    }
}
