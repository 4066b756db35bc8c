//! Request, response, and error types for the conversion service.
//!
//! These types are shared by every framework integration so the JSON shape
//! of requests and envelopes is defined in exactly one place.
//!
//! # Wire Format
//!
//! Request body (`POST /api/pdf/generate`):
//!
//! ```json
//! {
//!     "htmlData": ["PGgxPkhlbGxvPC9oMT4="],
//!     "fileName": "report.pdf",
//!     "format": "A4",
//!     "css": "h1 { color: navy; }"
//! }
//! ```
//!
//! Envelope (every non-PDF response):
//!
//! ```json
//! {
//!     "statusCode": 400,
//!     "message": "HtmlData is required to generate PDF.",
//!     "data": null,
//!     "timeStamp": "2024-05-01T12:00:00Z",
//!     "success": false
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::assembler::AssemblyError;
use crate::auth::AuthError;
use crate::engine::PageFormat;
use crate::error::EngineError;
use crate::stats::{EngineState, EngineStats};

/// Filename used when the request does not name one.
pub const DEFAULT_FILENAME: &str = "document.pdf";

// ============================================================================
// Request
// ============================================================================

/// Body of a conversion request.
///
/// Field names are camelCase on the wire; PascalCase aliases are accepted
/// for clients written against case-insensitive binders.
///
/// # Examples
///
/// ```rust
/// use html2pdf_gateway::service::ConversionRequest;
///
/// let request: ConversionRequest =
///     serde_json::from_str(r#"{"htmlData": ["PGgxPkhpPC9oMT4="]}"#).unwrap();
///
/// assert_eq!(request.filename_or_default(), "document.pdf");
/// assert_eq!(request.fragments().len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Ordered base64-encoded HTML fragments; one or more pages each.
    #[serde(default, alias = "HtmlData")]
    pub html_data: Option<Vec<String>>,

    /// Suggested download name. Defaults to [`DEFAULT_FILENAME`].
    #[serde(default, alias = "FileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Page format name, case-insensitive. Defaults to A4.
    #[serde(default, alias = "Format", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Stylesheet applied to every fragment.
    #[serde(default, alias = "Css", skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

impl ConversionRequest {
    /// The fragments, or an empty slice when absent.
    pub fn fragments(&self) -> &[String] {
        self.html_data.as_deref().unwrap_or_default()
    }

    /// The requested filename, or [`DEFAULT_FILENAME`] if absent or blank.
    pub fn filename_or_default(&self) -> String {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string()
    }

    /// The requested page format, A4 when absent or blank.
    ///
    /// # Errors
    ///
    /// Returns a message listing supported formats for unknown names.
    pub fn page_format(&self) -> Result<PageFormat, String> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Ok(PageFormat::default()),
            Some(name) => name.parse(),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// A generated PDF ready to be sent as an attachment.
///
/// ```rust
/// use html2pdf_gateway::service::PdfResponse;
///
/// let response = PdfResponse::new(b"%PDF-1.7".to_vec(), "report.pdf".to_string());
/// assert_eq!(response.content_disposition(), "attachment; filename=\"report.pdf\"");
/// ```
#[derive(Debug, Clone)]
pub struct PdfResponse {
    /// Raw PDF bytes.
    pub data: Vec<u8>,

    /// Suggested filename, as requested by the client.
    pub filename: String,
}

impl PdfResponse {
    /// Wrap rendered bytes and the filename to send them under.
    pub fn new(data: Vec<u8>, filename: String) -> Self {
        Self { data, filename }
    }

    /// `Content-Disposition` header value.
    ///
    /// Quotes, backslashes and control characters are replaced so the value
    /// is always a valid header. Non-ASCII names get an ASCII fallback plus
    /// an RFC 5987 `filename*` parameter.
    ///
    /// ```rust
    /// use html2pdf_gateway::service::PdfResponse;
    ///
    /// let response = PdfResponse::new(vec![], "Bericht-Grüße.pdf".to_string());
    /// assert_eq!(
    ///     response.content_disposition(),
    ///     "attachment; filename=\"Bericht-Gr__e.pdf\"; filename*=UTF-8''Bericht-Gr%C3%BC%C3%9Fe.pdf"
    /// );
    /// ```
    pub fn content_disposition(&self) -> String {
        let fallback: String = self
            .filename
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_control() || !c.is_ascii() => '_',
                c => c,
            })
            .collect();

        if self.filename.is_ascii() {
            format!("attachment; filename=\"{}\"", fallback)
        } else {
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback,
                urlencoding::encode(&self.filename)
            )
        }
    }

    /// Size of the PDF in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Uniform JSON envelope for every non-PDF response.
///
/// `success` is derived from `status_code` at construction and cannot
/// disagree with it.
///
/// ```rust
/// use html2pdf_gateway::service::PdfEnvelope;
///
/// let envelope = PdfEnvelope::new(401, "nope", None);
/// assert!(!envelope.success());
///
/// let json = serde_json::to_value(&envelope).unwrap();
/// assert_eq!(json["statusCode"], 401);
/// assert_eq!(json["success"], false);
/// assert!(json["timeStamp"].is_string());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfEnvelope {
    status_code: u16,
    message: String,
    data: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    time_stamp: OffsetDateTime,
    success: bool,
}

impl PdfEnvelope {
    /// Build an envelope stamped with the current UTC time.
    pub fn new<S: Into<String>>(status_code: u16, message: S, data: Option<Value>) -> Self {
        Self {
            status_code,
            message: message.into(),
            data,
            time_stamp: OffsetDateTime::now_utc(),
            success: (200..300).contains(&status_code),
        }
    }

    /// Envelope for a failed request.
    pub fn from_error(error: &PdfServiceError) -> Self {
        Self::new(error.status_code(), error.envelope_message(), None)
    }

    /// HTTP status the envelope was sent with.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Human-readable outcome.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Payload. Always `None` on errors.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// When the envelope was built, in UTC.
    pub fn time_stamp(&self) -> OffsetDateTime {
        self.time_stamp
    }

    /// `true` iff the status code is in `200..300`.
    pub fn success(&self) -> bool {
        self.success
    }
}

impl From<&PdfServiceError> for PdfEnvelope {
    fn from(error: &PdfServiceError) -> Self {
        Self::from_error(error)
    }
}

impl From<PdfServiceError> for PdfEnvelope {
    fn from(error: PdfServiceError) -> Self {
        Self::from_error(&error)
    }
}

/// Liveness response.
///
/// ```text
/// GET /health
///
/// { "status": "healthy", "service": "html2pdf-gateway" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the endpoint responds.
    pub status: String,
    /// Package name of the running gateway.
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

/// Readiness response.
///
/// ```text
/// GET /ready
///
/// { "state": "ready", "ready": true, "launches": 1, "engineId": 0, "uptimeSecs": 42 }
/// ```
///
/// `ready` is `false` only while a launch is in progress: an uninitialized
/// or closed engine is launched lazily by the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusResponse {
    /// Lifecycle state name, e.g. `"ready"`.
    pub state: String,
    /// Whether a request would be served without waiting on a launch.
    pub ready: bool,
    /// Engines launched since startup.
    pub launches: u64,
    /// ID of the published engine.
    pub engine_id: Option<u64>,
    /// Seconds since the published engine launched.
    pub uptime_secs: Option<u64>,
}

impl From<EngineStats> for EngineStatusResponse {
    fn from(stats: EngineStats) -> Self {
        Self {
            state: stats.state.as_str().to_string(),
            ready: stats.state != EngineState::Initializing,
            launches: stats.launches,
            engine_id: stats.engine_id,
            uptime_secs: stats.uptime.map(|u| u.as_secs()),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Everything that can go wrong while serving a conversion request.
///
/// # HTTP Status Code Mapping
///
/// | Error Type | HTTP Status | Error Code | Retryable |
/// |------------|-------------|------------|-----------|
/// | [`Unauthorized`](Self::Unauthorized) | 401 | `UNAUTHORIZED` | ❌ |
/// | [`InvalidInput`](Self::InvalidInput) | 400 | `INVALID_INPUT` | ❌ |
/// | [`PayloadTooLarge`](Self::PayloadTooLarge) | 413 | `PAYLOAD_TOO_LARGE` | ❌ |
/// | [`EngineUnavailable`](Self::EngineUnavailable) | 500 | `ENGINE_UNAVAILABLE` | ✅ |
/// | [`RenderFailure`](Self::RenderFailure) | 500 | `RENDER_FAILED` | ✅ |
/// | [`EmptyOutput`](Self::EmptyOutput) | 500 | `EMPTY_OUTPUT` | ✅ |
/// | [`RenderTimeout`](Self::RenderTimeout) | 500 | `RENDER_TIMEOUT` | ✅ |
/// | [`Internal`](Self::Internal) | 500 | `INTERNAL_ERROR` | ❌ |
///
/// Engine-side failures all surface as 500 so clients see one uniform
/// failure shape; use [`error_code`](Self::error_code) in logs to tell
/// them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfServiceError {
    /// Missing, wrong, or unconfigured API key.
    Unauthorized(AuthError),

    /// The request body is missing, malformed, or fails validation.
    InvalidInput(String),

    /// The request body exceeds the configured size limit.
    ///
    /// Only reported to callers that passed the key check.
    PayloadTooLarge(String),

    /// The engine could not be launched or is not responding.
    EngineUnavailable(String),

    /// The engine failed while loading or printing the document.
    RenderFailure(String),

    /// The engine produced zero bytes.
    EmptyOutput,

    /// A render-side time bound was exceeded.
    RenderTimeout(String),

    /// Unexpected failure, e.g. a panicked blocking task.
    Internal(String),
}

impl std::fmt::Display for PdfServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(cause) => write!(f, "{}", cause),
            Self::InvalidInput(msg) | Self::PayloadTooLarge(msg) => write!(f, "{}", msg),
            Self::EmptyOutput => write!(f, "Generated PDF is empty."),
            Self::EngineUnavailable(msg)
            | Self::RenderFailure(msg)
            | Self::RenderTimeout(msg)
            | Self::Internal(msg) => write!(f, "Failed to generate PDF: {}", msg),
        }
    }
}

impl std::error::Error for PdfServiceError {}

impl PdfServiceError {
    /// HTTP status code for this error.
    ///
    /// ```rust
    /// use html2pdf_gateway::service::PdfServiceError;
    ///
    /// assert_eq!(PdfServiceError::InvalidInput("bad".into()).status_code(), 400);
    /// assert_eq!(PdfServiceError::EmptyOutput.status_code(), 500);
    /// ```
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::InvalidInput(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::EngineUnavailable(_)
            | Self::RenderFailure(_)
            | Self::EmptyOutput
            | Self::RenderTimeout(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::EngineUnavailable(_) => "ENGINE_UNAVAILABLE",
            Self::RenderFailure(_) => "RENDER_FAILED",
            Self::EmptyOutput => "EMPTY_OUTPUT",
            Self::RenderTimeout(_) => "RENDER_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EngineUnavailable(_)
            | Self::RenderFailure(_)
            | Self::EmptyOutput
            | Self::RenderTimeout(_) => true,

            Self::Unauthorized(_)
            | Self::InvalidInput(_)
            | Self::PayloadTooLarge(_)
            | Self::Internal(_) => false,
        }
    }

    /// Text placed in the envelope's `message` field.
    pub fn envelope_message(&self) -> String {
        self.to_string()
    }
}

impl From<EngineError> for PdfServiceError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Launch(_)
            | EngineError::HealthCheckFailed(_)
            | EngineError::Configuration(_) => Self::EngineUnavailable(error.to_string()),
            EngineError::Context(_) | EngineError::Load(_) | EngineError::Print(_) => {
                Self::RenderFailure(error.to_string())
            }
            EngineError::Timeout(_) => Self::RenderTimeout(error.to_string()),
        }
    }
}

impl From<AssemblyError> for PdfServiceError {
    fn from(error: AssemblyError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}

impl From<AuthError> for PdfServiceError {
    fn from(error: AuthError) -> Self {
        Self::Unauthorized(error)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
