//! Mock rendering engine for testing.
//!
//! This module provides an in-process fake of [`EngineLauncher`],
//! [`RenderEngine`] and [`RenderContext`] that can be configured to succeed,
//! fail or hang, so the manager and the request pipeline can be tested
//! without Chrome installed.
//!
//! # Feature Flag
//!
//! This module is only available when:
//! - The `test-utils` feature is enabled, OR
//! - During testing (`#[cfg(test)]`)
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::engine::mock::{MockEngineLauncher, RenderBehavior};
//!
//! // Launcher that always fails
//! let launcher = MockEngineLauncher::always_fails("Chrome not installed");
//!
//! // Launcher whose engine fails to print
//! let launcher = MockEngineLauncher::new().with_render(RenderBehavior::FailOnPrint);
//! let telemetry = launcher.telemetry();
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{EngineLauncher, PdfOptions, RenderContext, RenderEngine, SettleOptions};
use crate::error::{EngineError, Result};
use crate::traits::Healthcheck;

/// Bytes returned by [`RenderBehavior::default`].
pub const MOCK_PDF_BYTES: &[u8] = b"%PDF-1.7\n%mock\n1 0 obj<<>>endobj\ntrailer<<>>\n%%EOF\n";

/// What the mock engine's render contexts do.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderBehavior {
    /// Print succeeds with these bytes.
    Pdf(Vec<u8>),
    /// Print succeeds with zero bytes.
    Empty,
    /// Loading the document fails.
    FailOnLoad,
    /// Printing fails.
    FailOnPrint,
    /// Network never settles for this long.
    Hang(Duration),
}

impl Default for RenderBehavior {
    fn default() -> Self {
        RenderBehavior::Pdf(MOCK_PDF_BYTES.to_vec())
    }
}

#[derive(Default)]
struct TelemetryInner {
    launches: AtomicUsize,
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    engines_closed: AtomicUsize,
    latest_connection: Mutex<Option<Arc<AtomicBool>>>,
    last_html: Mutex<Option<String>>,
    last_pdf_options: Mutex<Option<PdfOptions>>,
}

/// Shared counters recorded by a [`MockEngineLauncher`] and everything it
/// creates.
///
/// Cloning is cheap; clones observe the same counters, so tests can keep a
/// handle after moving the launcher into a manager.
#[derive(Clone, Default)]
pub struct MockTelemetry {
    inner: Arc<TelemetryInner>,
}

impl MockTelemetry {
    /// Number of launch attempts, successful or not.
    pub fn launch_count(&self) -> usize {
        self.inner.launches.load(Ordering::SeqCst)
    }

    /// Number of render contexts opened.
    pub fn contexts_opened(&self) -> usize {
        self.inner.contexts_opened.load(Ordering::SeqCst)
    }

    /// Number of render contexts closed.
    pub fn contexts_closed(&self) -> usize {
        self.inner.contexts_closed.load(Ordering::SeqCst)
    }

    /// Number of engines closed through [`RenderEngine::close`].
    pub fn engines_closed(&self) -> usize {
        self.inner.engines_closed.load(Ordering::SeqCst)
    }

    /// Simulate the most recently launched engine crashing.
    ///
    /// Returns `false` if nothing has been launched yet.
    pub fn disconnect_latest(&self) -> bool {
        let guard = self
            .inner
            .latest_connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(flag) => {
                flag.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// The last document handed to `load_html`.
    pub fn last_html(&self) -> Option<String> {
        self.inner
            .last_html
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The options of the last `print_pdf` call.
    pub fn last_pdf_options(&self) -> Option<PdfOptions> {
        *self
            .inner
            .last_pdf_options
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MockTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTelemetry")
            .field("launches", &self.launch_count())
            .field("contexts_opened", &self.contexts_opened())
            .field("contexts_closed", &self.contexts_closed())
            .field("engines_closed", &self.engines_closed())
            .finish()
    }
}

/// Mock engine launcher for testing without Chrome.
///
/// This launcher can be configured to:
/// - Always succeed with an in-process fake engine
/// - Always fail with a specific error
/// - Fail after N successful launches
/// - Take a while to launch
/// - Produce engines with a given [`RenderBehavior`]
///
/// # Thread Safety
///
/// This launcher is `Send + Sync` and tracks state using atomic operations.
pub struct MockEngineLauncher {
    /// Whether every launch fails.
    should_fail: bool,

    /// Error message when failing.
    error_message: String,

    /// Optional: fail after this many launches.
    fail_after: Option<usize>,

    /// Blocking delay before each launch completes.
    launch_delay: Option<Duration>,

    /// Behavior of contexts opened on launched engines.
    render: RenderBehavior,

    telemetry: MockTelemetry,
}

impl MockEngineLauncher {
    /// A launcher whose engines render [`MOCK_PDF_BYTES`].
    pub fn new() -> Self {
        Self {
            should_fail: false,
            error_message: String::new(),
            fail_after: None,
            launch_delay: None,
            render: RenderBehavior::default(),
            telemetry: MockTelemetry::default(),
        }
    }

    /// A launcher that always fails with the given message.
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self {
            should_fail: true,
            error_message: message.into(),
            ..Self::new()
        }
    }

    /// A launcher that fails once `n` launches have been attempted.
    pub fn fail_after_n<S: Into<String>>(n: usize, message: S) -> Self {
        Self {
            error_message: message.into(),
            fail_after: Some(n),
            ..Self::new()
        }
    }

    /// Block each launch for `delay`.
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = Some(delay);
        self
    }

    /// Set the behavior of render contexts.
    pub fn with_render(mut self, render: RenderBehavior) -> Self {
        self.render = render;
        self
    }

    /// Counters shared with this launcher and its engines.
    pub fn telemetry(&self) -> MockTelemetry {
        self.telemetry.clone()
    }
}

impl Default for MockEngineLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineLauncher for MockEngineLauncher {
    /// Launch a fake engine or return the configured error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Launch`] when configured to fail.
    fn launch(&self) -> Result<Arc<dyn RenderEngine>> {
        let count = self.telemetry.inner.launches.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.launch_delay {
            std::thread::sleep(delay);
        }

        if self.should_fail {
            log::debug!("MockEngineLauncher: Returning configured failure");
            return Err(EngineError::Launch(self.error_message.clone()));
        }

        if let Some(fail_after) = self.fail_after {
            if count >= fail_after {
                log::debug!("MockEngineLauncher: Failing after {} launches", fail_after);
                return Err(EngineError::Launch(self.error_message.clone()));
            }
        }

        log::debug!("MockEngineLauncher: Launching mock engine #{}", count + 1);

        let connected = Arc::new(AtomicBool::new(true));
        *self
            .telemetry
            .inner
            .latest_connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&connected));

        Ok(Arc::new(MockEngine {
            connected,
            closed: AtomicBool::new(false),
            render: self.render.clone(),
            telemetry: self.telemetry.clone(),
        }))
    }
}

impl std::fmt::Debug for MockEngineLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEngineLauncher")
            .field("should_fail", &self.should_fail)
            .field("error_message", &self.error_message)
            .field("fail_after", &self.fail_after)
            .field("launch_delay", &self.launch_delay)
            .field("render", &self.render)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

struct MockEngine {
    connected: Arc<AtomicBool>,
    closed: AtomicBool,
    render: RenderBehavior,
    telemetry: MockTelemetry,
}

impl Healthcheck for MockEngine {
    fn ping(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::HealthCheckFailed("engine is closed".to_string()));
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(EngineError::HealthCheckFailed("engine disconnected".to_string()));
        }
        Ok(())
    }
}

impl RenderEngine for MockEngine {
    fn open_context(&self) -> Result<Box<dyn RenderContext>> {
        self.ping()
            .map_err(|e| EngineError::Context(e.to_string()))?;
        self.telemetry.inner.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRenderContext {
            render: self.render.clone(),
            telemetry: self.telemetry.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.connected.store(false, Ordering::SeqCst);
            self.telemetry.inner.engines_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct MockRenderContext {
    render: RenderBehavior,
    telemetry: MockTelemetry,
    closed: AtomicBool,
}

impl RenderContext for MockRenderContext {
    fn load_html(&self, html: &str, _timeout: Duration) -> Result<()> {
        *self
            .telemetry
            .inner
            .last_html
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(html.to_string());

        if self.render == RenderBehavior::FailOnLoad {
            return Err(EngineError::Load("mock load failure".to_string()));
        }
        Ok(())
    }

    fn wait_for_network_idle(&self, settle: &SettleOptions) -> Result<()> {
        if let RenderBehavior::Hang(busy_for) = self.render {
            std::thread::sleep(busy_for.min(settle.timeout));
            if busy_for > settle.timeout {
                return Err(EngineError::Timeout(format!(
                    "network activity did not settle within {}ms",
                    settle.timeout.as_millis()
                )));
            }
        }
        Ok(())
    }

    fn print_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        *self
            .telemetry
            .inner
            .last_pdf_options
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(*options);

        match &self.render {
            RenderBehavior::Pdf(bytes) => Ok(bytes.clone()),
            RenderBehavior::Empty => Ok(Vec::new()),
            RenderBehavior::FailOnPrint => Err(EngineError::Print("mock print failure".to_string())),
            _ => Ok(MOCK_PDF_BYTES.to_vec()),
        }
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.telemetry.inner.contexts_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_launcher_always_fails() {
        let launcher = MockEngineLauncher::always_fails("Test error");

        match launcher.launch() {
            Err(EngineError::Launch(msg)) => assert_eq!(msg, "Test error"),
            _ => panic!("Expected Launch error"),
        }
        assert_eq!(launcher.telemetry().launch_count(), 1);
    }

    #[test]
    fn test_mock_launcher_fail_after_n() {
        let launcher = MockEngineLauncher::fail_after_n(2, "Exhausted");

        assert!(launcher.launch().is_ok());
        assert!(launcher.launch().is_ok());

        match launcher.launch() {
            Err(EngineError::Launch(msg)) => assert_eq!(msg, "Exhausted"),
            _ => panic!("Expected Launch error on third attempt"),
        }
        assert_eq!(launcher.telemetry().launch_count(), 3);
    }

    #[test]
    fn test_mock_engine_renders_default_pdf() {
        let launcher = MockEngineLauncher::new();
        let telemetry = launcher.telemetry();
        let engine = launcher.launch().unwrap();

        let context = engine.open_context().unwrap();
        context.load_html("<p>hi</p>", Duration::from_secs(1)).unwrap();
        context.wait_for_network_idle(&SettleOptions::default()).unwrap();
        let pdf = context.print_pdf(&PdfOptions::default()).unwrap();
        context.close().unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(telemetry.last_html().as_deref(), Some("<p>hi</p>"));
        assert_eq!(telemetry.last_pdf_options(), Some(PdfOptions::default()));
        assert_eq!(telemetry.contexts_opened(), 1);
        assert_eq!(telemetry.contexts_closed(), 1);
    }

    #[test]
    fn test_mock_context_close_counted_once() {
        let launcher = MockEngineLauncher::new();
        let telemetry = launcher.telemetry();
        let context = launcher.launch().unwrap().open_context().unwrap();

        context.close().unwrap();
        context.close().unwrap();
        assert_eq!(telemetry.contexts_closed(), 1);
    }

    #[test]
    fn test_disconnect_latest_fails_ping() {
        let launcher = MockEngineLauncher::new();
        let telemetry = launcher.telemetry();
        assert!(!telemetry.disconnect_latest());

        let engine = launcher.launch().unwrap();
        assert!(engine.ping().is_ok());
        assert!(telemetry.disconnect_latest());
        assert!(engine.ping().is_err());
        assert!(!engine.is_connected());
        assert!(engine.open_context().is_err());
    }

    #[test]
    fn test_closed_engine_fails_ping() {
        let launcher = MockEngineLauncher::new();
        let telemetry = launcher.telemetry();
        let engine = launcher.launch().unwrap();

        engine.close().unwrap();
        engine.close().unwrap();
        assert!(engine.ping().is_err());
        assert_eq!(telemetry.engines_closed(), 1);
    }

    #[test]
    fn test_hang_exceeding_timeout_times_out() {
        let launcher = MockEngineLauncher::new().with_render(RenderBehavior::Hang(Duration::from_secs(5)));
        let context = launcher.launch().unwrap().open_context().unwrap();

        let settle = SettleOptions {
            timeout: Duration::from_millis(20),
            idle_window: Duration::from_millis(5),
            poll_interval: Duration::from_millis(5),
        };
        assert!(matches!(
            context.wait_for_network_idle(&settle),
            Err(EngineError::Timeout(_))
        ));
    }

    #[test]
    fn test_failure_behaviors() {
        let context = MockEngineLauncher::new()
            .with_render(RenderBehavior::FailOnLoad)
            .launch()
            .unwrap()
            .open_context()
            .unwrap();
        assert!(matches!(
            context.load_html("x", Duration::from_secs(1)),
            Err(EngineError::Load(_))
        ));

        let context = MockEngineLauncher::new()
            .with_render(RenderBehavior::FailOnPrint)
            .launch()
            .unwrap()
            .open_context()
            .unwrap();
        assert!(matches!(
            context.print_pdf(&PdfOptions::default()),
            Err(EngineError::Print(_))
        ));

        let context = MockEngineLauncher::new()
            .with_render(RenderBehavior::Empty)
            .launch()
            .unwrap()
            .open_context()
            .unwrap();
        assert!(context.print_pdf(&PdfOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_mock_launcher_debug() {
        let debug_str = format!("{:?}", MockEngineLauncher::always_fails("Test"));
        assert!(debug_str.contains("MockEngineLauncher"));
        assert!(debug_str.contains("should_fail"));
        assert!(debug_str.contains("true"));
    }
}
