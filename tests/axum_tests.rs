//! HTTP-level tests for the Axum router.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use html2pdf_gateway::engine::mock::{MOCK_PDF_BYTES, MockEngineLauncher, RenderBehavior};
use html2pdf_gateway::integrations::axum::{router, router_with_body_limit};
use html2pdf_gateway::prelude::*;
use tower::ServiceExt;

const HELLO_B64: &str = "PGgxPkhlbGxvPC9oMT4=";

fn service(launcher: MockEngineLauncher, key: &str) -> SharedPdfService {
    let manager = RenderEngineManager::builder()
        .launcher(Box::new(launcher))
        .build()
        .unwrap()
        .into_shared();
    PdfService::new(manager, Arc::new(StaticApiKey::new(key))).into_shared()
}

fn random_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn generate(path: &str, key: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header("X-Pdf-Api-Key", key);
    }
    builder.body(body.into()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_generate_returns_attachment() {
    let key = random_key();
    let app = router(service(MockEngineLauncher::new(), &key));

    let body = format!(r#"{{"htmlData":["{}"],"fileName":"hello.pdf"}}"#, HELLO_B64);
    let response = app
        .oneshot(generate("/api/pdf/generate", Some(&key), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"hello.pdf\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], MOCK_PDF_BYTES);
}

#[tokio::test]
async fn test_legacy_path_is_served() {
    let key = random_key();
    let app = router(service(MockEngineLauncher::new(), &key));

    let body = format!(r#"{{"HtmlData":["{}"]}}"#, HELLO_B64);
    let response = app
        .oneshot(generate("/api/Pdf/Generate", Some(&key), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_key_is_401_envelope() {
    let app = router(service(MockEngineLauncher::new(), &random_key()));

    let response = app
        .oneshot(generate("/api/pdf/generate", None, "{not even json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["statusCode"], 401);
    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());
    assert!(json["timeStamp"].is_string());
}

#[tokio::test]
async fn test_empty_html_data_is_400_envelope() {
    let key = random_key();
    let app = router(service(MockEngineLauncher::new(), &key));

    let response = app
        .oneshot(generate("/api/pdf/generate", Some(&key), r#"{"htmlData":[]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["message"], "HtmlData is required to generate PDF.");
}

#[tokio::test]
async fn test_render_failure_is_500_envelope() {
    let key = random_key();
    let app = router(service(
        MockEngineLauncher::new().with_render(RenderBehavior::Empty),
        &key,
    ));

    let body = format!(r#"{{"htmlData":["{}"]}}"#, HELLO_B64);
    let response = app
        .oneshot(generate("/api/pdf/generate", Some(&key), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["statusCode"], 500);
    assert_eq!(json["message"], "Generated PDF is empty.");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let key = random_key();
    let app = router_with_body_limit(service(MockEngineLauncher::new(), &key), 64);

    let body = format!(r#"{{"htmlData":["{}"]}}"#, "A".repeat(256));
    let response = app
        .oneshot(generate("/api/pdf/generate", Some(&key), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = json_body(response).await;
    assert_eq!(json["statusCode"], 413);
    assert_eq!(json["success"], false);
}

/// The size limit never leaks past the key check: no key means 401 whatever the body.
#[tokio::test]
async fn test_oversized_body_without_key_is_401_envelope() {
    let launcher = MockEngineLauncher::new();
    let telemetry = launcher.telemetry();
    let app = router_with_body_limit(service(launcher, &random_key()), 64);

    let body = format!(r#"{{"htmlData":["{}"]}}"#, "A".repeat(256));
    let response = app
        .oneshot(generate("/api/pdf/generate", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["statusCode"], 401);
    assert_eq!(json["success"], false);
    assert_eq!(telemetry.launch_count(), 0);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = router(service(MockEngineLauncher::new(), &random_key()));

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "html2pdf-gateway");

    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["state"], "uninitialized");
    assert_eq!(json["ready"], true);
}
