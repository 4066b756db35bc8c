//! Request orchestration for HTML-fragment → PDF conversion (framework-agnostic).
//!
//! [`PdfService`] runs one request through every stage and turns each
//! failure into a [`PdfServiceError`]:
//!
//! ```text
//! Received ──▶ Authorized ──▶ Validated ──▶ Assembled ──▶ Rendering ──▶ Responded
//!    │             │              │             │              │
//!    └── 401 ──────┘── 400 ───────┘── 400 ──────┘── 500 ───────┘
//! ```
//!
//! # Blocking Behavior
//!
//! [`PdfService::handle`] is async. The engine calls underneath are blocking
//! and always run on [`tokio::task::spawn_blocking`], so handlers may await
//! it directly on the runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = PdfService::with_env_api_key(manager);
//!
//! match service.handle(Some("s3cret"), body).await {
//!     Ok(pdf) => std::fs::write(&pdf.filename, &pdf.data)?,
//!     Err(e) => eprintln!("{}: {}", e.status_code(), e),
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler;
use crate::auth;
use crate::config::{ApiKeySource, EnvApiKeySource};
use crate::engine::{PdfOptions, SettleOptions};
use crate::error::EngineError;
use crate::handle::EngineHandle;
use crate::manager::SharedEngineManager;

use super::types::{
    ConversionRequest, EngineStatusResponse, HealthResponse, PdfResponse, PdfServiceError,
};

/// Shared reference to the service, as stored in framework state.
pub type SharedPdfService = Arc<PdfService>;

const BODY_REQUIRED: &str = "Request body is required.";
const HTML_DATA_REQUIRED: &str = "HtmlData is required to generate PDF.";

/// The conversion pipeline, bound to one engine manager and one key source.
///
/// # Thread Safety
///
/// `Send + Sync`; share one instance (usually as [`SharedPdfService`])
/// across all handlers.
pub struct PdfService {
    manager: SharedEngineManager,
    api_keys: Arc<dyn ApiKeySource>,
}

impl PdfService {
    /// Create a service with an explicit key source.
    pub fn new(manager: SharedEngineManager, api_keys: Arc<dyn ApiKeySource>) -> Self {
        Self { manager, api_keys }
    }

    /// Create a service that reads the key from `PDF_GENERATOR_API_KEY`.
    pub fn with_env_api_key(manager: SharedEngineManager) -> Self {
        Self::new(manager, Arc::new(EnvApiKeySource::new()))
    }

    /// Wrap in an [`Arc`] for sharing across handlers.
    pub fn into_shared(self) -> SharedPdfService {
        Arc::new(self)
    }

    /// The engine manager this service renders with.
    pub fn manager(&self) -> &SharedEngineManager {
        &self.manager
    }

    /// Serve one request: gate, validate, assemble, render.
    ///
    /// The key is checked before the body is even parsed.
    ///
    /// # Errors
    ///
    /// See [`PdfServiceError`] for the status mapping.
    pub async fn handle(
        &self,
        api_key: Option<&str>,
        body: &[u8],
    ) -> Result<PdfResponse, PdfServiceError> {
        let started = Instant::now();

        let result = self.process(api_key, body).await;

        match &result {
            Ok(pdf) => log::info!(
                "✅ Generated {} ({} bytes) in {:?}",
                pdf.filename,
                pdf.size(),
                started.elapsed()
            ),
            Err(e) if e.status_code() < 500 => {
                log::warn!("⚠️ Request rejected [{}]: {}", e.error_code(), e)
            }
            Err(e) => log::error!(
                "❌ Request failed after {:?} [{}]: {}",
                started.elapsed(),
                e.error_code(),
                e
            ),
        }

        result
    }

    async fn process(
        &self,
        api_key: Option<&str>,
        body: &[u8],
    ) -> Result<PdfResponse, PdfServiceError> {
        self.authorize(api_key)?;
        let request = parse_request(body)?;
        self.generate(&request).await
    }

    /// Error for a request whose body the framework refused to buffer.
    ///
    /// The key is still checked first, so an unauthorized caller gets 401
    /// whatever it sent. Otherwise `status == 413` becomes
    /// [`PdfServiceError::PayloadTooLarge`] and anything else
    /// [`PdfServiceError::InvalidInput`].
    pub fn reject_body(&self, api_key: Option<&str>, status: u16, reason: &str) -> PdfServiceError {
        let error = match self.authorize(api_key) {
            Err(e) => e,
            Ok(()) if status == 413 => PdfServiceError::PayloadTooLarge(format!(
                "Request body is too large: {}",
                reason
            )),
            Ok(()) => PdfServiceError::InvalidInput(format!("Invalid request body: {}", reason)),
        };
        log::warn!("⚠️ Request rejected [{}]: {}", error.error_code(), error);
        error
    }

    /// Check a supplied key against the configured one, read fresh.
    pub fn authorize(&self, provided: Option<&str>) -> Result<(), PdfServiceError> {
        let configured = self.api_keys.api_key();
        auth::authorize(configured.as_deref(), provided).map_err(PdfServiceError::from)
    }

    /// Render an already-authorized, already-parsed request.
    pub async fn generate(
        &self,
        request: &ConversionRequest,
    ) -> Result<PdfResponse, PdfServiceError> {
        let fragments = request.fragments();
        if fragments.is_empty() {
            return Err(PdfServiceError::InvalidInput(HTML_DATA_REQUIRED.to_string()));
        }

        let options = PdfOptions {
            format: request.page_format().map_err(PdfServiceError::InvalidInput)?,
            print_background: true,
        };
        let html = assembler::assemble(fragments, request.css.as_deref())?;
        log::debug!(
            "Rendering {} fragment(s) as {} ({} bytes of HTML)",
            fragments.len(),
            options.format,
            html.len()
        );

        let render_timeout = self.manager.config().render_timeout;
        let data = match tokio::time::timeout(render_timeout, self.render(html, options)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PdfServiceError::RenderTimeout(format!(
                    "rendering did not finish within {}s",
                    render_timeout.as_secs()
                )));
            }
        };

        if data.is_empty() {
            return Err(PdfServiceError::EmptyOutput);
        }

        Ok(PdfResponse::new(data, request.filename_or_default()))
    }

    async fn render(&self, html: String, options: PdfOptions) -> Result<Vec<u8>, PdfServiceError> {
        let engine = self.manager.acquire().await?;

        let config = self.manager.config();
        let settle = SettleOptions::from_config(config);
        let load_timeout = config.load_timeout;

        tokio::task::spawn_blocking(move || {
            render_document(&engine, &html, &settle, &options, load_timeout)
        })
        .await
        .map_err(|e| PdfServiceError::Internal(format!("render task failed: {}", e)))?
        .map_err(PdfServiceError::from)
    }

    /// Liveness payload; never touches the engine.
    pub fn health(&self) -> HealthResponse {
        HealthResponse::default()
    }

    /// Readiness payload from the manager's current state.
    pub fn engine_status(&self) -> EngineStatusResponse {
        EngineStatusResponse::from(self.manager.stats())
    }
}

impl std::fmt::Debug for PdfService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfService")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

/// Parse a request body.
///
/// # Errors
///
/// [`PdfServiceError::InvalidInput`] for an empty or `null` body, or
/// malformed JSON.
pub fn parse_request(body: &[u8]) -> Result<ConversionRequest, PdfServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PdfServiceError::InvalidInput(BODY_REQUIRED.to_string()));
    }

    match serde_json::from_slice::<Option<ConversionRequest>>(body) {
        Ok(Some(request)) => Ok(request),
        Ok(None) => Err(PdfServiceError::InvalidInput(BODY_REQUIRED.to_string())),
        Err(e) => Err(PdfServiceError::InvalidInput(format!(
            "Invalid request body: {}",
            e
        ))),
    }
}

/// Load, settle and print one document in a fresh render context.
///
/// Blocking. The context is closed on every path, success or failure.
pub(crate) fn render_document(
    engine: &EngineHandle,
    html: &str,
    settle: &SettleOptions,
    options: &PdfOptions,
    load_timeout: Duration,
) -> Result<Vec<u8>, EngineError> {
    let context = engine.scoped_context()?;

    context.load_html(html, load_timeout)?;
    context.wait_for_network_idle(settle)?;
    let data = context.print_pdf(options)?;

    log::debug!("Engine {} printed {} bytes", engine.id(), data.len());
    Ok(data)
}

// ============================================================================
// Unit Tests
// ============================================================================
