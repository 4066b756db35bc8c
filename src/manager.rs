//! Shared rendering engine with lazy, self-healing lifecycle management.
//!
//! This module provides [`RenderEngineManager`], which owns the single
//! process-wide rendering engine and hands out [`EngineHandle`]s to it.
//!
//! # Overview
//!
//! - **Lazy launch**: the engine starts on first [`acquire`](RenderEngineManager::acquire)
//!   (or [`warm`](RenderEngineManager::warm) at startup)
//! - **Single flight**: concurrent acquisitions during a launch wait for it
//!   instead of starting their own engine
//! - **Self-healing**: a handle that fails its liveness probe is closed and
//!   replaced on the next acquisition
//! - **Graceful shutdown**: [`shutdown`](RenderEngineManager::shutdown) closes
//!   every tab and the engine within a bounded time
//!
//! # Architecture
//!
//! ```text
//! RenderEngineManager (Clone)
//!   └─ Arc<ManagerInner>
//!       ├─ state: AtomicU8          (fast-path ready check)
//!       ├─ slot: RwLock<Option<EngineHandle>>  (the published engine)
//!       ├─ lifecycle: tokio Mutex<Lifecycle>  (serializes launch and shutdown)
//!       ├─ launcher: Arc<dyn EngineLauncher>
//!       └─ launches: AtomicU64
//! ```
//!
//! # Critical Invariants
//!
//! 1. **State transitions** only happen while holding `lifecycle`
//! 2. **No I/O under `slot`**: the handle is cloned out before probing
//! 3. **Detached initialization**: launches run in their own task, so a
//!    cancelled caller never leaves the state at `Initializing`
//! 4. **One launch at a time**: a launch that outlives `launch_timeout` is
//!    kept in `Lifecycle` and settled before another one starts
//!
//! # Example
//!
//! ```rust,no_run
//! use html2pdf_gateway::{ChromeEngineLauncher, RenderEngineManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = RenderEngineManager::builder()
//!         .launcher(Box::new(ChromeEngineLauncher::with_defaults()))
//!         .build()?;
//!
//!     manager.spawn_warm();
//!
//!     let engine = manager.acquire().await?;
//!     println!("Using engine {}", engine.id());
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::engine::EngineLauncher;
use crate::error::{EngineError, Result};
use crate::handle::EngineHandle;
use crate::stats::{EngineState, EngineStats};
use crate::tracked::TrackedEngine;
use crate::traits::Healthcheck;

/// Shared reference to the manager, as injected into services.
pub type SharedEngineManager = Arc<RenderEngineManager>;

// ============================================================================
// ManagerInner
// ============================================================================

/// State guarded by the lifecycle lock.
#[derive(Default)]
struct Lifecycle {
    /// A launch that outlived `launch_timeout`. Its blocking worker keeps
    /// running, so it must finish before another launch starts.
    abandoned: Option<JoinHandle<Result<TrackedEngine>>>,
}

/// Internal shared state for the engine manager.
///
/// # Lock Ordering
///
/// `lifecycle` (async) may be held while briefly taking `slot`; never the
/// other way around. Neither `slot` guard is held across an `.await`.
pub(crate) struct ManagerInner {
    config: EngineConfig,
    launcher: Arc<dyn EngineLauncher>,
    state: AtomicU8,
    slot: RwLock<Option<EngineHandle>>,
    lifecycle: tokio::sync::Mutex<Lifecycle>,
    launches: AtomicU64,
}

impl ManagerInner {
    fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: EngineState) {
        let previous = EngineState::from_u8(self.state.swap(state.as_u8(), Ordering::AcqRel));
        if previous != state {
            log::debug!("Engine state: {} -> {}", previous, state);
        }
    }

    fn current(&self) -> Option<EngineHandle> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| {
                log::warn!("⚠️ Engine slot lock poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }

    /// The published handle, only if the state says `Ready`.
    fn current_if_ready(&self) -> Option<EngineHandle> {
        if self.state() != EngineState::Ready {
            return None;
        }
        self.current()
    }

    fn publish(&self, handle: Option<EngineHandle>) -> Option<EngineHandle> {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| {
            log::warn!("⚠️ Engine slot lock poisoned, recovering");
            poisoned.into_inner()
        });
        std::mem::replace(&mut *slot, handle)
    }

    /// Liveness probe on a blocking worker, bounded by `launch_timeout`.
    async fn probe(&self, handle: &EngineHandle) -> Result<()> {
        let probed = handle.clone();
        let task = tokio::task::spawn_blocking(move || probed.tracked().ping());

        match tokio::time::timeout(self.config.launch_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(EngineError::HealthCheckFailed(e.to_string())),
            Err(_) => Err(EngineError::HealthCheckFailed(format!(
                "no answer within {}s",
                self.config.launch_timeout.as_secs()
            ))),
        }
    }

    /// Wait up to `wait` for an abandoned launch and return what it produced.
    ///
    /// Leaves the task in place and fails if it is still running.
    async fn settle_abandoned(
        &self,
        lifecycle: &mut Lifecycle,
        wait: Duration,
    ) -> Result<Option<TrackedEngine>> {
        let Some(mut task) = lifecycle.abandoned.take() else {
            return Ok(None);
        };

        log::debug!("Waiting up to {:?} for an abandoned launch to finish", wait);
        match tokio::time::timeout(wait, &mut task).await {
            Ok(Ok(Ok(tracked))) => Ok(Some(tracked)),
            Ok(Ok(Err(e))) => {
                log::debug!("Abandoned launch finished with an error: {}", e);
                Ok(None)
            }
            Ok(Err(e)) => {
                log::warn!("⚠️ Abandoned launch task failed: {}", e);
                Ok(None)
            }
            Err(_) => {
                lifecycle.abandoned = Some(task);
                Err(EngineError::Launch(
                    "previous launch is still running".to_string(),
                ))
            }
        }
    }

    /// Launch and validate a new engine on a blocking worker.
    ///
    /// An engine left behind by an earlier timed-out launch is adopted
    /// instead of starting a second process.
    async fn launch(&self, lifecycle: &mut Lifecycle) -> Result<EngineHandle> {
        if let Some(tracked) = self
            .settle_abandoned(lifecycle, self.config.launch_timeout)
            .await?
        {
            let handle = EngineHandle::new(Arc::new(tracked));
            match self.probe(&handle).await {
                Ok(()) => {
                    log::info!("✅ Adopted engine {} from an earlier launch", handle.id());
                    return Ok(handle);
                }
                Err(e) => {
                    log::warn!("⚠️ Engine {} from an earlier launch is unusable: {}", handle.id(), e);
                    self.close_engine(handle).await;
                }
            }
        }

        let launcher = Arc::clone(&self.launcher);
        let started = Instant::now();

        let mut task = tokio::task::spawn_blocking(move || -> Result<TrackedEngine> {
            let tracked = TrackedEngine::new(launcher.launch()?);
            if let Err(e) = tracked.ping() {
                let _ = tracked.engine().close();
                return Err(EngineError::Launch(format!(
                    "engine failed validation after launch: {}",
                    e
                )));
            }
            Ok(tracked)
        });

        let tracked = match tokio::time::timeout(self.config.launch_timeout, &mut task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(EngineError::Launch(format!("launch task failed: {}", e))),
            Err(_) => {
                lifecycle.abandoned = Some(task);
                return Err(EngineError::Launch(format!(
                    "engine did not start within {}s",
                    self.config.launch_timeout.as_secs()
                )));
            }
        };

        log::info!(
            "✅ Engine {} launched in {:?}",
            tracked.id(),
            started.elapsed()
        );
        Ok(EngineHandle::new(Arc::new(tracked)))
    }

    /// Close an engine on a blocking worker, bounded by `shutdown_timeout`.
    async fn close_engine(&self, handle: EngineHandle) {
        let id = handle.id();
        let task = tokio::task::spawn_blocking(move || handle.close());

        match tokio::time::timeout(self.config.shutdown_timeout, task).await {
            Ok(Ok(Ok(()))) => log::info!("✅ Engine {} closed", id),
            Ok(Ok(Err(e))) => log::warn!("⚠️ Engine {} closed with errors: {}", id, e),
            Ok(Err(e)) => log::error!("❌ Engine {} close task failed: {}", id, e),
            Err(_) => log::warn!(
                "⚠️ Engine {} did not close within {}s, abandoning it",
                id,
                self.config.shutdown_timeout.as_secs()
            ),
        }
    }

    /// Slow path of [`RenderEngineManager::acquire`].
    ///
    /// Runs in its own task; see the module-level invariants.
    async fn initialize(self: Arc<Self>) -> Result<EngineHandle> {
        let mut lifecycle = self.lifecycle.lock().await;

        // Another caller may have finished a launch while we waited.
        if let Some(handle) = self.current_if_ready() {
            if self.probe(&handle).await.is_ok() {
                log::trace!("Engine {} became ready while waiting", handle.id());
                return Ok(handle);
            }
        }

        if let Some(stale) = self.publish(None) {
            log::warn!("⚠️ Engine {} is disconnected, replacing it", stale.id());
            self.close_engine(stale).await;
        }

        self.set_state(EngineState::Initializing);
        log::info!("🚀 Launching rendering engine...");

        match self.launch(&mut lifecycle).await {
            Ok(handle) => {
                self.publish(Some(handle.clone()));
                self.launches.fetch_add(1, Ordering::SeqCst);
                self.set_state(EngineState::Ready);
                Ok(handle)
            }
            Err(e) => {
                log::error!("❌ Engine launch failed: {}", e);
                self.set_state(EngineState::Uninitialized);
                Err(e)
            }
        }
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        let remaining = self
            .slot
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(handle) = remaining {
            log::debug!("Manager dropped with engine {} still open, closing it", handle.id());
            if let Err(e) = handle.close() {
                log::warn!("⚠️ Failed to close engine {} on drop: {}", handle.id(), e);
            }
        }
    }
}

// ============================================================================
// RenderEngineManager
// ============================================================================

/// Owner of the shared rendering engine.
///
/// Cheap to clone; clones share the same engine and state.
///
/// # Thread Safety
///
/// All methods take `&self` and are safe to call concurrently from any task.
#[derive(Clone)]
pub struct RenderEngineManager {
    inner: Arc<ManagerInner>,
}

impl RenderEngineManager {
    /// Create a builder.
    pub fn builder() -> RenderEngineManagerBuilder {
        RenderEngineManagerBuilder::new()
    }

    /// Wrap in an [`Arc`] for injection.
    pub fn into_shared(self) -> SharedEngineManager {
        Arc::new(self)
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Get a handle to a connected engine, launching one if needed.
    ///
    /// The returned handle passed a liveness probe at the moment it was
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Launch`] if the engine could not be started within
    ///   `launch_timeout` or failed validation
    /// - [`EngineError::Configuration`] if the launcher is misconfigured
    pub async fn acquire(&self) -> Result<EngineHandle> {
        if let Some(handle) = self.inner.current_if_ready() {
            match self.inner.probe(&handle).await {
                Ok(()) => {
                    log::trace!("Reusing engine {}", handle.id());
                    return Ok(handle);
                }
                Err(e) => {
                    let last_healthy = handle.tracked().last_ping_time().map(|t| t.elapsed());
                    log::warn!(
                        "⚠️ Engine {} degraded (last healthy {:?} ago): {}",
                        handle.id(),
                        last_healthy,
                        e
                    );
                }
            }
        }

        let inner = Arc::clone(&self.inner);
        match tokio::spawn(inner.initialize()).await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Launch(format!(
                "initialization task failed: {}",
                e
            ))),
        }
    }

    /// Eagerly launch the engine. Failures are logged, not returned.
    pub async fn warm(&self) {
        log::info!("🔥 Warming up rendering engine...");
        match self.acquire().await {
            Ok(handle) => log::info!("✅ Rendering engine {} warm", handle.id()),
            Err(e) => log::warn!(
                "⚠️ Engine warm-up failed, will retry on first request: {}",
                e
            ),
        }
    }

    /// Run [`warm`](Self::warm) in the background.
    pub fn spawn_warm(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.warm().await })
    }

    /// Close the engine and transition to [`EngineState::Closed`].
    ///
    /// Idempotent. Waits for any in-flight launch to finish first, and up
    /// to `shutdown_timeout` for one that already timed out. A later
    /// [`acquire`](Self::acquire) launches a fresh engine.
    pub async fn shutdown(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;

        let taken = self.inner.publish(None);
        self.inner.set_state(EngineState::Closed);

        match self
            .inner
            .settle_abandoned(&mut lifecycle, self.inner.config.shutdown_timeout)
            .await
        {
            Ok(Some(tracked)) => {
                let orphan = EngineHandle::new(Arc::new(tracked));
                log::info!("🛑 Closing engine {} from an abandoned launch", orphan.id());
                self.inner.close_engine(orphan).await;
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ Shutting down anyway: {}", e),
        }

        match taken {
            Some(handle) => {
                log::info!("🛑 Shutting down rendering engine {}...", handle.id());
                self.inner.close_engine(handle).await;
            }
            None => log::debug!("Shutdown requested with no running engine"),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.inner.state()
    }

    /// Snapshot of the manager for monitoring.
    pub fn stats(&self) -> EngineStats {
        let state = self.inner.state();
        let current = self.inner.current();
        EngineStats {
            state,
            launches: self.inner.launches.load(Ordering::SeqCst),
            engine_id: current.as_ref().map(|h| h.id()),
            uptime: current.as_ref().map(|h| h.age()),
        }
    }
}

impl std::fmt::Debug for RenderEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngineManager")
            .field("stats", &self.stats())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RenderEngineManagerBuilder
// ============================================================================

/// Builder for [`RenderEngineManager`].
///
/// ```rust,ignore
/// let manager = RenderEngineManager::builder()
///     .config(EngineConfigBuilder::new().render_timeout(Duration::from_secs(30)).build()?)
///     .launcher(Box::new(ChromeEngineLauncher::with_defaults()))
///     .build()?;
/// ```
pub struct RenderEngineManagerBuilder {
    /// Uses [`EngineConfig::default`] if not provided.
    config: Option<EngineConfig>,

    /// Required.
    launcher: Option<Box<dyn EngineLauncher>>,
}

impl RenderEngineManagerBuilder {
    /// Empty builder. A launcher must be set before [`build`](Self::build).
    pub fn new() -> Self {
        Self {
            config: None,
            launcher: None,
        }
    }

    /// Set custom configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the engine launcher (required).
    pub fn launcher(mut self, launcher: Box<dyn EngineLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Build the manager. Does not launch anything.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if no launcher was provided.
    pub fn build(self) -> Result<RenderEngineManager> {
        let config = self.config.unwrap_or_default();
        let launcher = self.launcher.ok_or_else(|| {
            EngineError::Configuration("No engine launcher provided".to_string())
        })?;

        log::debug!("Building engine manager with config: {:?}", config);

        Ok(RenderEngineManager {
            inner: Arc::new(ManagerInner {
                config,
                launcher: Arc::from(launcher),
                state: AtomicU8::new(EngineState::Uninitialized.as_u8()),
                slot: RwLock::new(None),
                lifecycle: tokio::sync::Mutex::new(Lifecycle::default()),
                launches: AtomicU64::new(0),
            }),
        })
    }
}

impl Default for RenderEngineManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Initialization (feature-gated)
// ============================================================================

/// Build a manager with the Chrome launcher from environment variables.
///
/// Does not launch the engine; call [`RenderEngineManager::spawn_warm`]
/// afterwards to start it in the background.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] if the environment holds invalid
/// values.
///
/// # Example
///
/// ```rust,ignore
/// let manager = init_engine_manager()?;
/// manager.spawn_warm();
/// ```
#[cfg(feature = "env-config")]
pub fn init_engine_manager() -> Result<SharedEngineManager> {
    use crate::config::env::{chrome_path_from_env, from_env};
    use crate::engine::ChromeEngineLauncher;

    log::info!("Initializing engine manager from environment...");

    let config = from_env()?;

    let launcher: Box<dyn EngineLauncher> = match chrome_path_from_env() {
        Some(path) => {
            log::info!("Using custom Chrome path: {}", path);
            Box::new(ChromeEngineLauncher::with_path(path))
        }
        None => {
            log::info!("Using auto-detected Chrome browser");
            Box::new(ChromeEngineLauncher::with_defaults())
        }
    };

    let manager = RenderEngineManager::builder()
        .config(config)
        .launcher(launcher)
        .build()
        .map_err(|e| {
            log::error!("❌ Failed to create engine manager: {}", e);
            e
        })?;

    log::info!("✅ Engine manager created");
    Ok(manager.into_shared())
}

// ============================================================================
// Unit Tests
// ============================================================================
