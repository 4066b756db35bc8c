//! Error types for the rendering engine layer.
//!
//! This module provides [`EngineError`], a unified error type for engine
//! launch, liveness probing, and rendering operations, and a convenient
//! [`Result`] type alias.
//!
//! Request-level failures (authorization, payload validation, HTTP mapping)
//! live in [`PdfServiceError`](crate::service::PdfServiceError), which wraps
//! these errors at the orchestrator boundary.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_gateway::{EngineError, Result};
//!
//! fn render() -> Result<Vec<u8>> {
//!     Err(EngineError::Print("printer jammed".to_string()))
//! }
//!
//! match render() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(EngineError::Timeout(msg)) => println!("Too slow: {}", msg),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

/// Errors that can occur while managing or using the rendering engine.
///
/// # Example
///
/// ```rust
/// use html2pdf_gateway::EngineError;
///
/// fn describe(error: &EngineError) -> &'static str {
///     match error {
///         EngineError::Launch(_) | EngineError::HealthCheckFailed(_) => "engine unavailable",
///         EngineError::Context(_) | EngineError::Load(_) | EngineError::Print(_) => "render failed",
///         EngineError::Timeout(_) => "timed out",
///         EngineError::Configuration(_) => "misconfigured",
///     }
/// }
///
/// assert_eq!(describe(&EngineError::Launch("no chrome".into())), "engine unavailable");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Failed to launch (or relaunch) the engine process.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not executable
    /// - Launch exceeded the configured `launch_timeout`
    /// - System resource limits exceeded
    ///
    /// ```rust
    /// use html2pdf_gateway::EngineError;
    ///
    /// let error = EngineError::Launch("Chrome binary not found".to_string());
    /// assert_eq!(error.to_string(), "Failed to launch rendering engine: Chrome binary not found");
    /// ```
    #[error("Failed to launch rendering engine: {0}")]
    Launch(String),

    /// The engine did not answer a liveness probe.
    ///
    /// The manager treats this as the implicit `Degraded` state and
    /// relaunches the engine on the next acquisition.
    #[error("Rendering engine health check failed: {0}")]
    HealthCheckFailed(String),

    /// A render context (tab) could not be opened on the shared engine.
    #[error("Failed to open render context: {0}")]
    Context(String),

    /// The assembled document could not be loaded into the render context.
    #[error("Failed to load document: {0}")]
    Load(String),

    /// The engine failed while printing the page to PDF.
    #[error("Failed to print PDF: {0}")]
    Print(String),

    /// A bounded wait elapsed (network settle, render, or shutdown).
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration or launch options.
    ///
    /// ```rust
    /// use html2pdf_gateway::EngineError;
    ///
    /// let error = EngineError::Configuration("load_timeout must be greater than 0".to_string());
    /// assert_eq!(error.to_string(), "Configuration error: load_timeout must be greater than 0");
    /// ```
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Convenience conversion from [`String`] to [`EngineError::Configuration`].
///
/// ```rust
/// use html2pdf_gateway::EngineError;
///
/// let error: EngineError = "invalid configuration".to_string().into();
/// assert!(matches!(error, EngineError::Configuration(_)));
/// ```
impl From<String> for EngineError {
    fn from(msg: String) -> Self {
        EngineError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`EngineError::Configuration`].
impl From<&str> for EngineError {
    fn from(msg: &str) -> Self {
        EngineError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let error: EngineError = "test error".into();
        match error {
            EngineError::Configuration(msg) => {
                assert_eq!(msg, "test error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }

        let error: EngineError = "another error".to_string().into();
        assert!(matches!(error, EngineError::Configuration(ref m) if m == "another error"));
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::HealthCheckFailed("connection closed".to_string());
        assert_eq!(
            error.to_string(),
            "Rendering engine health check failed: connection closed"
        );

        let error = EngineError::Context("target crashed".to_string());
        assert_eq!(error.to_string(), "Failed to open render context: target crashed");

        let error = EngineError::Load("bad data url".to_string());
        assert_eq!(error.to_string(), "Failed to load document: bad data url");

        let error = EngineError::Print("no pages".to_string());
        assert_eq!(error.to_string(), "Failed to print PDF: no pages");

        let error = EngineError::Timeout("network did not settle".to_string());
        assert_eq!(error.to_string(), "Operation timed out: network did not settle");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + std::error::Error>() {}
        assert_send_sync::<EngineError>();
    }
}
