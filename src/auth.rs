//! Shared-secret access gate.
//!
//! Every conversion request must carry the configured secret in the
//! [`API_KEY_HEADER`] header. The check runs before the body is looked at.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "X-Pdf-Api-Key";

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The server has no usable key configured.
    #[error("PDF API key is not configured. Set PDF_GENERATOR_API_KEY.")]
    NotConfigured,

    /// The caller sent no key or the wrong one.
    #[error("Invalid or missing API key. Provide valid key in X-Pdf-Api-Key header.")]
    InvalidCredential,
}

/// Check a supplied key against the configured one.
///
/// Blank values never match. Both sides are hashed before comparison so the
/// timing is independent of the secret's length and content.
///
/// ```rust
/// use html2pdf_gateway::auth::{authorize, AuthError};
///
/// assert!(authorize(Some("s3cret"), Some("s3cret")).is_ok());
/// assert_eq!(authorize(Some("s3cret"), Some("guess")), Err(AuthError::InvalidCredential));
/// assert_eq!(authorize(None, Some("s3cret")), Err(AuthError::NotConfigured));
/// ```
pub fn authorize(configured: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let configured = match configured.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None => {
            log::error!("❌ Request rejected: no API key configured");
            return Err(AuthError::NotConfigured);
        }
    };

    let provided = match provided.filter(|k| !k.trim().is_empty()) {
        Some(key) => key,
        None => {
            log::warn!("⚠️ Request rejected: missing API key");
            return Err(AuthError::InvalidCredential);
        }
    };

    let expected = Sha256::digest(configured.as_bytes());
    let actual = Sha256::digest(provided.as_bytes());

    if bool::from(expected.as_slice().ct_eq(actual.as_slice())) {
        Ok(())
    } else {
        log::warn!("⚠️ Request rejected: invalid API key");
        Err(AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_key() {
        let key = uuid::Uuid::new_v4().to_string();
        assert_eq!(authorize(Some(&key), Some(&key)), Ok(()));
    }

    #[test]
    fn test_mismatch_and_prefix() {
        assert_eq!(
            authorize(Some("s3cret"), Some("s3cre")),
            Err(AuthError::InvalidCredential)
        );
        assert_eq!(
            authorize(Some("s3cret"), Some("s3cret ")),
            Err(AuthError::InvalidCredential)
        );
        assert_eq!(
            authorize(Some("s3cret"), Some("S3CRET")),
            Err(AuthError::InvalidCredential)
        );
    }

    #[test]
    fn test_missing_or_blank_provided() {
        assert_eq!(authorize(Some("s3cret"), None), Err(AuthError::InvalidCredential));
        assert_eq!(authorize(Some("s3cret"), Some("  ")), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn test_blank_configured_wins_over_provided() {
        assert_eq!(authorize(None, None), Err(AuthError::NotConfigured));
        assert_eq!(authorize(Some(""), Some("")), Err(AuthError::NotConfigured));
        assert_eq!(authorize(Some(" "), Some("anything")), Err(AuthError::NotConfigured));
    }

    #[test]
    fn test_messages() {
        assert!(AuthError::NotConfigured.to_string().contains("PDF_GENERATOR_API_KEY"));
        assert!(AuthError::InvalidCredential.to_string().contains(API_KEY_HEADER));
    }
}
