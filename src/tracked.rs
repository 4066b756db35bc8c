//! Tracked engine with metadata for lifecycle management.
//!
//! This module provides [`TrackedEngine`], which wraps a launched
//! [`RenderEngine`] with the information the manager needs to log and report
//! on it.
//!
//! # Architecture
//!
//! ```text
//! TrackedEngine
//! ├── id: u64 (unique identifier)
//! ├── engine: Arc<dyn RenderEngine> (shared ownership)
//! ├── last_ping: Mutex<Instant> (health tracking)
//! └── launched_at: Instant (uptime)
//! ```
//!
//! Users interact with the engine through
//! [`EngineHandle`](crate::EngineHandle), which derefs to the engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::engine::RenderEngine;
use crate::error::Result;
use crate::traits::Healthcheck;

/// A launched engine with metadata.
pub(crate) struct TrackedEngine {
    /// Sequential identifier, unique for the process lifetime.
    id: u64,

    engine: Arc<dyn RenderEngine>,

    /// Timestamp of the last successful liveness probe.
    last_ping: Mutex<Instant>,

    launched_at: Instant,
}

impl TrackedEngine {
    /// Wrap a freshly launched engine, assigning the next id.
    ///
    /// Does not probe the engine; the manager validates it before publishing.
    pub(crate) fn new(engine: Arc<dyn RenderEngine>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let now = Instant::now();
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            engine,
            last_ping: Mutex::new(now),
            launched_at: now,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn engine(&self) -> &Arc<dyn RenderEngine> {
        &self.engine
    }

    /// Time since the engine was launched.
    #[inline]
    pub(crate) fn age(&self) -> Duration {
        self.launched_at.elapsed()
    }

    /// Last successful ping, or `None` if the lock is poisoned.
    pub(crate) fn last_ping_time(&self) -> Option<Instant> {
        self.last_ping.lock().ok().map(|guard| *guard)
    }
}

impl Healthcheck for TrackedEngine {
    /// Probe the wrapped engine and record the time on success.
    fn ping(&self) -> Result<()> {
        log::trace!("Pinging engine {}...", self.id);

        self.engine.ping().map_err(|e| {
            log::warn!("⚠️ Engine {} failed liveness probe: {}", self.id, e);
            e
        })?;

        // A poisoned timestamp does not make the engine unhealthy.
        match self.last_ping.lock() {
            Ok(mut ping) => {
                *ping = Instant::now();
                log::trace!("✅ Engine {} ping successful", self.id);
            }
            Err(e) => {
                log::warn!(
                    "⚠️ Engine {} ping succeeded but failed to update timestamp: {}",
                    self.id,
                    e
                );
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for TrackedEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedEngine")
            .field("id", &self.id)
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
