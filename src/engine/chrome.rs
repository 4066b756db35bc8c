//! Headless Chrome/Chromium engine implementation.
//!
//! This module provides [`ChromeEngineLauncher`] for starting headless Chrome
//! with container-friendly launch flags, the [`ChromeEngine`] wrapper that the
//! manager shares between requests, and the tab-backed render context.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::ChromeEngineLauncher;
//!
//! // Auto-detect Chrome installation
//! let launcher = ChromeEngineLauncher::with_defaults();
//!
//! // Or specify custom path
//! let launcher = ChromeEngineLauncher::with_path("/usr/bin/chromium".to_string());
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{EngineLauncher, PdfOptions, RenderContext, RenderEngine, SettleOptions};
use crate::error::{EngineError, Result};
use crate::traits::Healthcheck;

/// Chrome rejects navigations to URLs longer than 2 MiB.
const MAX_DATA_URL_LEN: usize = 2 * 1024 * 1024;

/// How long the DevTools connection may go without events before
/// `headless_chrome` drops it. The engine is shared and can sit idle
/// between requests for a long time.
const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Evaluates to -1 while the page is still loading, otherwise to the number
/// of resources fetched so far.
const READINESS_PROBE_JS: &str = r#"(() => {
    if (document.readyState !== 'complete') return -1;
    if (!Array.from(document.images).every((img) => img.complete)) return -1;
    if (document.fonts && document.fonts.status !== 'loaded') return -1;
    return performance.getEntriesByType('resource').length;
})()"#;

/// Launcher for headless Chrome/Chromium engines.
///
/// # Thread Safety
///
/// This launcher is `Send + Sync` and can be shared across threads.
pub struct ChromeEngineLauncher {
    /// Produces launch options for each launch.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,
}

impl ChromeEngineLauncher {
    /// Create a launcher with a custom launch options function.
    ///
    /// ```rust,ignore
    /// use html2pdf_gateway::{ChromeEngineLauncher, EngineError, create_chrome_options};
    ///
    /// let launcher = ChromeEngineLauncher::new(|| {
    ///     create_chrome_options(Some("/opt/chrome/chrome"))
    ///         .map_err(|e| EngineError::Configuration(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        Self {
            launch_options_fn: Box::new(launch_options_fn),
        }
    }

    /// Create a launcher that lets `headless_chrome` find Chrome.
    pub fn with_defaults() -> Self {
        log::debug!("🔧 Creating ChromeEngineLauncher with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| EngineError::Configuration(e.to_string()))
        })
    }

    /// Create a launcher for a Chrome binary at a custom path.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!("🔧 Creating ChromeEngineLauncher with custom path: {}", chrome_path);
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| EngineError::Configuration(e.to_string()))
        })
    }
}

impl EngineLauncher for ChromeEngineLauncher {
    /// Launch Chrome.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Configuration`] if launch options generation fails.
    /// * [`EngineError::Launch`] if Chrome fails to start.
    fn launch(&self) -> Result<Arc<dyn RenderEngine>> {
        log::trace!("ChromeEngineLauncher::launch() called");

        let options = (self.launch_options_fn)()?;

        log::debug!("🚀 Launching Chrome...");
        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            EngineError::Launch(e.to_string())
        })?;

        Ok(Arc::new(ChromeEngine::new(browser)))
    }
}

/// A running headless Chrome process and its DevTools connection.
///
/// [`RenderEngine::close`] releases the browser, which kills the process
/// once no call is still using it. A closed engine fails every later ping
/// and context request, even through handles taken before the close.
pub struct ChromeEngine {
    browser: Mutex<Option<Arc<Browser>>>,
}

impl ChromeEngine {
    /// Wrap an already launched browser.
    pub fn new(browser: Browser) -> Self {
        Self {
            browser: Mutex::new(Some(Arc::new(browser))),
        }
    }

    /// The live browser, or `None` once closed.
    fn browser(&self) -> Option<Arc<Browser>> {
        self.browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether [`RenderEngine::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.browser().is_none()
    }
}

impl Healthcheck for ChromeEngine {
    fn ping(&self) -> Result<()> {
        let browser = self
            .browser()
            .ok_or_else(|| EngineError::HealthCheckFailed("engine is closed".to_string()))?;
        browser.get_version().map(|_| ()).map_err(|e| {
            log::debug!("Chrome liveness probe failed: {}", e);
            EngineError::HealthCheckFailed(e.to_string())
        })
    }
}

impl RenderEngine for ChromeEngine {
    fn open_context(&self) -> Result<Box<dyn RenderContext>> {
        let browser = self
            .browser()
            .ok_or_else(|| EngineError::Context("engine is closed".to_string()))?;
        let tab = browser.new_tab().map_err(|e| {
            log::error!("❌ Failed to create tab: {}", e);
            EngineError::Context(e.to_string())
        })?;
        Ok(Box::new(ChromeRenderContext { tab }))
    }

    fn close(&self) -> Result<()> {
        let taken = self
            .browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(browser) = taken else {
            log::trace!("Chrome engine already closed");
            return Ok(());
        };

        // Snapshot first: closing a tab updates the browser's tab list.
        let tabs: Vec<Arc<Tab>> = {
            let guard = browser
                .get_tabs()
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.clone()
        };

        log::debug!("Closing {} open tab(s)", tabs.len());
        let mut failures = 0;
        for tab in tabs {
            if let Err(e) = tab.close(false) {
                failures += 1;
                log::warn!("⚠️ Failed to close tab during engine shutdown: {}", e);
            }
        }

        drop(browser);
        log::debug!("🛑 Chrome process released");

        if failures > 0 {
            return Err(EngineError::Context(format!(
                "{} tab(s) could not be closed",
                failures
            )));
        }
        Ok(())
    }
}

/// A render context backed by a dedicated Chrome tab.
struct ChromeRenderContext {
    tab: Arc<Tab>,
}

impl RenderContext for ChromeRenderContext {
    fn load_html(&self, html: &str, timeout: Duration) -> Result<()> {
        self.tab.set_default_timeout(timeout);

        let data_url = format!(
            "data:text/html;charset=utf-8,{}",
            urlencoding::encode(html)
        );

        if data_url.len() <= MAX_DATA_URL_LEN {
            log::trace!("Loading document via data URL ({} bytes)", data_url.len());
            self.tab
                .navigate_to(&data_url)
                .and_then(|tab| tab.wait_until_navigated())
                .map_err(|e| {
                    log::error!("❌ Failed to load document: {}", e);
                    EngineError::Load(e.to_string())
                })?;
            return Ok(());
        }

        // A fresh tab's main frame shares its id with the target.
        log::trace!("Loading document via setDocumentContent ({} bytes)", html.len());
        self.tab
            .call_method(Page::SetDocumentContent {
                frame_id: self.tab.get_target_id().clone(),
                html: html.to_string(),
            })
            .map_err(|e| {
                log::error!("❌ Failed to set document content: {}", e);
                EngineError::Load(e.to_string())
            })?;
        Ok(())
    }

    fn wait_for_network_idle(&self, settle: &SettleOptions) -> Result<()> {
        settle_with(
            || {
                Ok(self
                    .tab
                    .evaluate(READINESS_PROBE_JS, false)
                    .map_err(|e| EngineError::Load(e.to_string()))?
                    .value
                    .and_then(|v| v.as_i64())
                    .unwrap_or(-1))
            },
            settle,
        )
    }

    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        let started = Instant::now();
        let data = self
            .tab
            .print_to_pdf(Some(build_print_options(options)))
            .map_err(|e| {
                log::error!("❌ Failed to generate PDF: {}", e);
                EngineError::Print(e.to_string())
            })?;
        log::debug!("PDF printed in {:?} ({} bytes)", started.elapsed(), data.len());
        Ok(data)
    }

    fn close(&self) -> Result<()> {
        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| EngineError::Context(e.to_string()))
    }
}

/// Tracks how long the page's resource count has stayed unchanged.
///
/// A negative sample means the page is still loading and restarts the
/// window, as does any change in the count.
#[derive(Debug, Default)]
struct QuietWindow {
    since: Option<(i64, Instant)>,
}

impl QuietWindow {
    /// Record a sample taken at `now`. True once the count has held for `idle_window`.
    fn observe(&mut self, resources: i64, now: Instant, idle_window: Duration) -> bool {
        if resources < 0 {
            self.since = None;
            return false;
        }
        match self.since {
            Some((seen, since)) if seen == resources => now.duration_since(since) >= idle_window,
            _ => {
                self.since = Some((resources, now));
                false
            }
        }
    }
}

/// Poll `sample` until the resource count goes quiet or `settle.timeout` passes.
fn settle_with<F>(mut sample: F, settle: &SettleOptions) -> Result<()>
where
    F: FnMut() -> Result<i64>,
{
    let start = Instant::now();
    let mut window = QuietWindow::default();

    log::trace!(
        "Waiting up to {:?} for network to settle (idle window {:?})",
        settle.timeout,
        settle.idle_window
    );

    while start.elapsed() < settle.timeout {
        let resources = sample()?;
        if window.observe(resources, Instant::now(), settle.idle_window) {
            log::debug!(
                "Network settled after {:?} ({} resources)",
                start.elapsed(),
                resources
            );
            return Ok(());
        }
        std::thread::sleep(settle.poll_interval);
    }

    log::warn!("⚠️ Network did not settle within {:?}", settle.timeout);
    Err(EngineError::Timeout(format!(
        "network activity did not settle within {}ms",
        settle.timeout.as_millis()
    )))
}

pub(crate) fn build_print_options(options: &PdfOptions) -> PrintToPdfOptions {
    let (paper_width, paper_height) = options.format.dimensions_inches();
    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(options.print_background),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    }
}

/// Create Chrome launch options with an optional custom binary path.
///
/// # Chrome Flags Applied
///
/// - `--no-sandbox` (via `sandbox(false)`), `--disable-setuid-sandbox`,
///   `--disable-dev-shm-usage` for containers
/// - GPU, WebGL, extensions, plugins, sync and default apps disabled
/// - Background throttling and hang monitor disabled so an idle shared
///   engine stays responsive
///
/// # Errors
///
/// Returns error if the options builder fails.
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    match chrome_path {
        Some(path) => log::debug!("🔧 Creating Chrome options with custom path: {}", path),
        None => log::debug!("🔧 Creating Chrome options (auto-detect browser)"),
    }

    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
    }

    builder
        .headless(true)
        .sandbox(false)
        .idle_browser_timeout(IDLE_CONNECTION_TIMEOUT)
        .disable_default_args(true)
        .args(vec![
            // Containers
            "--disable-setuid-sandbox".as_ref(),
            "--disable-dev-shm-usage".as_ref(),
            "--disable-crash-reporter".as_ref(),
            // Rendering
            "--disable-gpu-compositing".as_ref(),
            "--disable-software-rasterizer".as_ref(),
            "--disable-accelerated-2d-canvas".as_ref(),
            "--disable-webgl".as_ref(),
            "--disable-webgl2".as_ref(),
            // Features we never need
            "--disable-extensions".as_ref(),
            "--disable-plugins".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
            "--disable-popup-blocking".as_ref(),
            // Long-lived shared engine
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-hang-monitor".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!("❌ Failed to build Chrome launch options (path: {}): {}", path_msg, e);
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================
