//! Configuration for the rendering engine and the API key.
//!
//! This module provides [`EngineConfig`] and [`EngineConfigBuilder`] for the
//! engine's timeouts and readiness detection, and the [`ApiKeySource`] trait
//! that supplies the shared secret checked by the access gate.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use html2pdf_gateway::EngineConfigBuilder;
//!
//! let config = EngineConfigBuilder::new()
//!     .load_timeout(Duration::from_secs(20))
//!     .render_timeout(Duration::from_secs(45))
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.load_timeout.as_secs(), 20);
//! assert_eq!(config.render_timeout.as_secs(), 45);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, configuration can be loaded from
//! environment variables and an optional `app.env` file:
//!
//! ```rust,ignore
//! use html2pdf_gateway::config::env::from_env;
//!
//! let config = from_env()?;
//! ```
//!
//! See [`mod@env`] module for available environment variables.

use std::time::Duration;

/// Name of the environment variable holding the API key.
pub const API_KEY_ENV_VAR: &str = "PDF_GENERATOR_API_KEY";

/// Default maximum request body size (32 MiB).
///
/// Fragments arrive base64-encoded inside JSON, so bodies are roughly a
/// third larger than the HTML they carry.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// Configuration for the rendering engine lifecycle and render pipeline.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `launch_timeout` | 30s | Bound on starting the engine process |
/// | `load_timeout` | 30s | Bound on waiting for network activity to settle |
/// | `network_idle_window` | 500ms | Quiet period that counts as "settled" |
/// | `poll_interval` | 100ms | Readiness polling frequency |
/// | `render_timeout` | 60s | Bound on a whole render, including acquisition |
/// | `shutdown_timeout` | 10s | Bound on closing the engine |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum time to wait for the engine process to start and answer.
    pub launch_timeout: Duration,

    /// Maximum time to wait for a loaded document's resources to settle.
    ///
    /// Exceeding it fails the request with a render timeout instead of
    /// printing a half-loaded page.
    pub load_timeout: Duration,

    /// How long resource activity must stay unchanged before the page is
    /// considered settled.
    pub network_idle_window: Duration,

    /// How often the page's readiness is polled.
    pub poll_interval: Duration,

    /// Maximum time for one request's engine work (acquire, load, print).
    pub render_timeout: Duration,

    /// Maximum time the shutdown hook waits for the engine to close.
    pub shutdown_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            launch_timeout: Duration::from_secs(30),
            load_timeout: Duration::from_secs(30),
            network_idle_window: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            render_timeout: Duration::from_secs(60),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Builder for [`EngineConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use html2pdf_gateway::EngineConfigBuilder;
///
/// let result = EngineConfigBuilder::new()
///     .load_timeout(Duration::from_millis(100))
///     .network_idle_window(Duration::from_secs(1))
///     .build();
///
/// assert!(result.is_err());
/// ```
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the engine launch timeout.
    pub fn launch_timeout(mut self, timeout: Duration) -> Self {
        self.config.launch_timeout = timeout;
        self
    }

    /// Set the network-settle timeout.
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.config.load_timeout = timeout;
        self
    }

    /// Set the quiet period that counts as "network idle".
    pub fn network_idle_window(mut self, window: Duration) -> Self {
        self.config.network_idle_window = window;
        self
    }

    /// Set the readiness polling interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the per-request render timeout.
    pub fn render_timeout(mut self, timeout: Duration) -> Self {
        self.config.render_timeout = timeout;
        self
    }

    /// Set the shutdown timeout.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - Any timeout or interval is zero
    /// - `network_idle_window` is not shorter than `load_timeout`
    /// - `load_timeout` exceeds `render_timeout`
    pub fn build(self) -> std::result::Result<EngineConfig, String> {
        let c = &self.config;

        for (name, value) in [
            ("launch_timeout", c.launch_timeout),
            ("load_timeout", c.load_timeout),
            ("poll_interval", c.poll_interval),
            ("render_timeout", c.render_timeout),
            ("shutdown_timeout", c.shutdown_timeout),
        ] {
            if value.is_zero() {
                return Err(format!("{} must be greater than 0", name));
            }
        }

        if c.network_idle_window >= c.load_timeout {
            return Err("network_idle_window must be shorter than load_timeout".to_string());
        }

        if c.load_timeout > c.render_timeout {
            return Err("load_timeout cannot exceed render_timeout".to_string());
        }

        Ok(self.config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// API key source
// ============================================================================

/// Supplies the configured API key.
///
/// The key is fetched on every request and never cached, so rotating it
/// does not require a restart.
pub trait ApiKeySource: Send + Sync {
    /// The configured key, or `None` when nothing is configured.
    fn api_key(&self) -> Option<String>;
}

/// Reads the API key from an environment variable on every call.
///
/// ```rust
/// use html2pdf_gateway::config::{ApiKeySource, EnvApiKeySource, API_KEY_ENV_VAR};
///
/// let source = EnvApiKeySource::new();
/// assert_eq!(source.var_name(), API_KEY_ENV_VAR);
/// ```
#[derive(Debug, Clone)]
pub struct EnvApiKeySource {
    var: String,
}

impl EnvApiKeySource {
    /// Read from [`API_KEY_ENV_VAR`].
    pub fn new() -> Self {
        Self::with_var(API_KEY_ENV_VAR)
    }

    /// Read from a custom variable name.
    pub fn with_var<S: Into<String>>(var: S) -> Self {
        Self { var: var.into() }
    }

    /// The variable this source reads.
    pub fn var_name(&self) -> &str {
        &self.var
    }
}

impl Default for EnvApiKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiKeySource for EnvApiKeySource {
    fn api_key(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// A fixed API key, for embedding and tests.
#[derive(Clone)]
pub struct StaticApiKey(Option<String>);

impl StaticApiKey {
    /// A configured key.
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(Some(key.into()))
    }

    /// No key configured; every request is rejected.
    pub fn unset() -> Self {
        Self(None)
    }
}

impl ApiKeySource for StaticApiKey {
    fn api_key(&self) -> Option<String> {
        self.0.clone()
    }
}

impl std::fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticApiKey")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// Requires the `env-config` feature.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `PDF_GENERATOR_API_KEY` | String | none | Secret expected in `X-Pdf-Api-Key` |
/// | `PDF_ENGINE_LAUNCH_TIMEOUT_SECONDS` | u64 | 30 | Engine launch bound |
/// | `PDF_ENGINE_LOAD_TIMEOUT_SECONDS` | u64 | 30 | Network-settle bound |
/// | `PDF_ENGINE_NETWORK_IDLE_MS` | u64 | 500 | Quiet period |
/// | `PDF_ENGINE_POLL_INTERVAL_MS` | u64 | 100 | Readiness polling |
/// | `PDF_ENGINE_RENDER_TIMEOUT_SECONDS` | u64 | 60 | Per-request render bound |
/// | `PDF_ENGINE_SHUTDOWN_TIMEOUT_SECONDS` | u64 | 10 | Shutdown bound |
/// | `CHROME_PATH` | String | auto | Custom Chrome binary path |
/// | `PDF_GATEWAY_BIND` | String | `0.0.0.0:8080` | Listen address |
/// | `PDF_GATEWAY_BODY_LIMIT_BYTES` | usize | 33554432 | Max request body |
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::EngineError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Default listen address for the HTTP server.
    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

    /// HTTP server settings for the gateway binary.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Socket address to listen on.
        pub bind_addr: String,
        /// Maximum accepted request body in bytes.
        pub body_limit: usize,
    }

    /// Load `app.env` into the process environment.
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    fn var_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        match std::env::var(name) {
            Ok(raw) => match raw.trim().parse() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("⚠️ Ignoring unparsable {}={:?}, using default", name, raw);
                    default
                }
            },
            Err(_) => default,
        }
    }

    /// Load [`EngineConfig`] from environment variables.
    ///
    /// Loads `app.env` first if present; missing variables fall back to
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the resulting values fail
    /// validation.
    pub fn from_env() -> Result<EngineConfig, EngineError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("📄 Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "📄 No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let launch_secs = var_or("PDF_ENGINE_LAUNCH_TIMEOUT_SECONDS", 30u64);
        let load_secs = var_or("PDF_ENGINE_LOAD_TIMEOUT_SECONDS", 30u64);
        let idle_ms = var_or("PDF_ENGINE_NETWORK_IDLE_MS", 500u64);
        let poll_ms = var_or("PDF_ENGINE_POLL_INTERVAL_MS", 100u64);
        let render_secs = var_or("PDF_ENGINE_RENDER_TIMEOUT_SECONDS", 60u64);
        let shutdown_secs = var_or("PDF_ENGINE_SHUTDOWN_TIMEOUT_SECONDS", 10u64);

        log::info!("🔧 Loading engine configuration from environment:");
        log::info!("   - Launch timeout: {}s", launch_secs);
        log::info!("   - Load timeout: {}s (idle window {}ms)", load_secs, idle_ms);
        log::info!("   - Render timeout: {}s", render_secs);
        log::info!("   - Shutdown timeout: {}s", shutdown_secs);

        EngineConfigBuilder::new()
            .launch_timeout(Duration::from_secs(launch_secs))
            .load_timeout(Duration::from_secs(load_secs))
            .network_idle_window(Duration::from_millis(idle_ms))
            .poll_interval(Duration::from_millis(poll_ms))
            .render_timeout(Duration::from_secs(render_secs))
            .shutdown_timeout(Duration::from_secs(shutdown_secs))
            .build()
            .map_err(EngineError::Configuration)
    }

    /// Custom Chrome binary path from `CHROME_PATH`, if set.
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
    }

    /// HTTP server settings from environment variables.
    pub fn server_config_from_env() -> ServerConfig {
        ServerConfig {
            bind_addr: var_or("PDF_GATEWAY_BIND", DEFAULT_BIND_ADDR.to_string()),
            body_limit: var_or("PDF_GATEWAY_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.launch_timeout, Duration::from_secs(30));
        assert_eq!(config.load_timeout, Duration::from_secs(30));
        assert_eq!(config.network_idle_window, Duration::from_millis(500));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.render_timeout, Duration::from_secs(60));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = EngineConfigBuilder::new()
            .launch_timeout(Duration::from_secs(5))
            .load_timeout(Duration::from_secs(8))
            .network_idle_window(Duration::from_millis(250))
            .poll_interval(Duration::from_millis(50))
            .render_timeout(Duration::from_secs(20))
            .shutdown_timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(config.launch_timeout.as_secs(), 5);
        assert_eq!(config.load_timeout.as_secs(), 8);
        assert_eq!(config.network_idle_window.as_millis(), 250);
        assert_eq!(config.poll_interval.as_millis(), 50);
        assert_eq!(config.render_timeout.as_secs(), 20);
        assert_eq!(config.shutdown_timeout.as_secs(), 3);
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let err = EngineConfigBuilder::new()
            .launch_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(
            err.contains("launch_timeout must be greater than 0"),
            "Expected validation error message, got: {}",
            err
        );
    }

    #[test]
    fn test_config_rejects_idle_window_longer_than_load_timeout() {
        let err = EngineConfigBuilder::new()
            .load_timeout(Duration::from_secs(1))
            .network_idle_window(Duration::from_secs(2))
            .build()
            .unwrap_err();
        assert!(err.contains("network_idle_window"));
    }

    #[test]
    fn test_config_rejects_load_timeout_above_render_timeout() {
        let err = EngineConfigBuilder::new()
            .load_timeout(Duration::from_secs(90))
            .render_timeout(Duration::from_secs(60))
            .build()
            .unwrap_err();
        assert!(err.contains("load_timeout cannot exceed render_timeout"));
    }

    #[test]
    fn test_static_api_key() {
        assert_eq!(StaticApiKey::new("s3cret").api_key().as_deref(), Some("s3cret"));
        assert_eq!(StaticApiKey::unset().api_key(), None);
    }

    #[test]
    fn test_static_api_key_debug_is_redacted() {
        let debug = format!("{:?}", StaticApiKey::new("s3cret"));
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_env_api_key_source_reads_on_every_call() {
        let var = format!("HTML2PDF_GATEWAY_TEST_KEY_{}", uuid::Uuid::new_v4().simple());
        let source = EnvApiKeySource::with_var(var.clone());

        assert_eq!(source.api_key(), None);

        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(&var, "first") };
        assert_eq!(source.api_key().as_deref(), Some("first"));

        unsafe { std::env::set_var(&var, "rotated") };
        assert_eq!(source.api_key().as_deref(), Some("rotated"));

        unsafe { std::env::remove_var(&var) };
        assert_eq!(source.api_key(), None);
    }
}
