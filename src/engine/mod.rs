//! Rendering engine abstractions and implementations.
//!
//! This module provides the traits the rest of the crate talks to, so the
//! manager and the request pipeline never depend on a concrete browser:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`EngineLauncher`] | Starts a new engine process (factory) |
//! | [`RenderEngine`] | The shared, long-lived engine |
//! | [`RenderContext`] | One isolated per-request session (a tab) |
//!
//! # Available Launchers
//!
//! | Launcher | Description |
//! |----------|-------------|
//! | [`ChromeEngineLauncher`] | Headless Chrome/Chromium via `headless_chrome` |
//! | [`mock::MockEngineLauncher`] | In-process fake for tests (feature-gated) |
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::engine::{ChromeEngineLauncher, EngineLauncher, PdfOptions, SettleOptions};
//!
//! let engine = ChromeEngineLauncher::with_defaults().launch()?;
//! let context = engine.open_context()?;
//! context.load_html("<h1>Hello</h1>", std::time::Duration::from_secs(10))?;
//! context.wait_for_network_idle(&SettleOptions::default())?;
//! let pdf = context.print_pdf(&PdfOptions::default())?;
//! context.close()?;
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeEngineLauncher, ChromeEngine, create_chrome_options};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::traits::Healthcheck;

/// Factory for engine processes.
///
/// # Thread Safety
///
/// Requires `Send + Sync`: the manager launches from a blocking worker thread.
pub trait EngineLauncher: Send + Sync {
    /// Start a new engine.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Configuration`](crate::EngineError::Configuration) for bad launch options
    /// - [`EngineError::Launch`](crate::EngineError::Launch) if the process fails to start
    fn launch(&self) -> Result<Arc<dyn RenderEngine>>;
}

/// The shared rendering engine.
///
/// All methods are blocking; async callers go through
/// [`tokio::task::spawn_blocking`].
pub trait RenderEngine: Healthcheck {
    /// Open a fresh, isolated render context.
    fn open_context(&self) -> Result<Box<dyn RenderContext>>;

    /// Release every open session and disconnect from the engine.
    fn close(&self) -> Result<()>;

    /// Whether a liveness probe currently succeeds.
    fn is_connected(&self) -> bool {
        self.ping().is_ok()
    }
}

/// A per-request browsing session opened on the shared engine.
pub trait RenderContext: Send {
    /// Load an HTML document, waiting at most `timeout` for navigation.
    fn load_html(&self, html: &str, timeout: Duration) -> Result<()>;

    /// Block until the page's resource loading has settled.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Timeout`](crate::EngineError::Timeout) if the
    /// page is still busy after `settle.timeout`.
    fn wait_for_network_idle(&self, settle: &SettleOptions) -> Result<()>;

    /// Print the loaded page to PDF bytes.
    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Destroy the session.
    fn close(&self) -> Result<()>;
}

// ============================================================================
// Page format
// ============================================================================

/// Paper size for the generated PDF.
///
/// ```rust
/// use html2pdf_gateway::engine::PageFormat;
///
/// let format: PageFormat = "letter".parse().unwrap();
/// assert_eq!(format, PageFormat::Letter);
/// assert_eq!(format.dimensions_inches(), (8.5, 11.0));
/// assert_eq!(PageFormat::default(), PageFormat::A4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageFormat {
    /// 297 × 420 mm
    A3,
    /// 210 × 297 mm
    #[default]
    A4,
    /// 148 × 210 mm
    A5,
    /// 8.5 × 11 in
    Letter,
    /// 8.5 × 14 in
    Legal,
    /// 11 × 17 in
    Tabloid,
    /// 17 × 11 in
    Ledger,
}

impl PageFormat {
    /// Every supported format.
    pub const ALL: [PageFormat; 7] = [
        PageFormat::A3,
        PageFormat::A4,
        PageFormat::A5,
        PageFormat::Letter,
        PageFormat::Legal,
        PageFormat::Tabloid,
        PageFormat::Ledger,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            PageFormat::A3 => "A3",
            PageFormat::A4 => "A4",
            PageFormat::A5 => "A5",
            PageFormat::Letter => "Letter",
            PageFormat::Legal => "Legal",
            PageFormat::Tabloid => "Tabloid",
            PageFormat::Ledger => "Ledger",
        }
    }

    /// Paper `(width, height)` in inches, as the DevTools protocol expects.
    pub fn dimensions_inches(self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (11.69, 16.54),
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::A5 => (5.83, 8.27),
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::Legal => (8.5, 14.0),
            PageFormat::Tabloid => (11.0, 17.0),
            PageFormat::Ledger => (17.0, 11.0),
        }
    }
}

impl FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        PageFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = PageFormat::ALL.iter().map(|f| f.name()).collect();
                format!(
                    "Unsupported page format '{}'. Supported formats: {}.",
                    wanted,
                    names.join(", ")
                )
            })
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Render options
// ============================================================================

/// Options passed to [`RenderContext::print_pdf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    /// Paper size.
    pub format: PageFormat,
    /// Print CSS backgrounds and colors.
    pub print_background: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PageFormat::A4,
            print_background: true,
        }
    }
}

/// How to decide that a loaded page has finished fetching resources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleOptions {
    /// Give up after this long.
    pub timeout: Duration,
    /// Resource activity must be unchanged for this long.
    pub idle_window: Duration,
    /// Polling frequency.
    pub poll_interval: Duration,
}

impl SettleOptions {
    /// Settle options derived from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            timeout: config.load_timeout,
            idle_window: config.network_idle_window,
            poll_interval: config.poll_interval,
        }
    }
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
