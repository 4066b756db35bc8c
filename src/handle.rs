//! Handles to the shared engine and its render contexts.
//!
//! [`EngineHandle`] is what [`RenderEngineManager::acquire`] hands out: a
//! cheap, cloneable reference to the one running engine. Unlike a pooled
//! resource it is never "returned"; many requests hold handles to the same
//! engine at once.
//!
//! [`ScopedContext`] follows the RAII pattern for the per-request render
//! context, so the context is closed even if the render fails halfway or
//! panics.
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! let engine = manager.acquire().await?;
//!
//! let pdf = tokio::task::spawn_blocking(move || {
//!     let context = engine.scoped_context()?;
//!     context.load_html("<h1>Hi</h1>", Duration::from_secs(10))?;
//!     context.print_pdf(&PdfOptions::default())
//!     // context closed here
//! }).await??;
//! ```
//!
//! [`RenderEngineManager::acquire`]: crate::RenderEngineManager::acquire

use std::sync::Arc;
use std::time::Duration;

use crate::engine::{RenderContext, RenderEngine};
use crate::error::Result;
use crate::tracked::TrackedEngine;

/// Shared handle to the running engine.
///
/// `Deref`s to [`RenderEngine`], so every engine method is available
/// directly on the handle.
#[derive(Clone)]
pub struct EngineHandle {
    tracked: Arc<TrackedEngine>,
}

impl EngineHandle {
    pub(crate) fn new(tracked: Arc<TrackedEngine>) -> Self {
        Self { tracked }
    }

    pub(crate) fn tracked(&self) -> &TrackedEngine {
        &self.tracked
    }

    /// The engine's unique ID, for log correlation.
    pub fn id(&self) -> u64 {
        self.tracked.id()
    }

    /// Time since the engine was launched.
    pub fn age(&self) -> Duration {
        self.tracked.age()
    }

    /// Open a render context that closes itself when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Context`](crate::EngineError::Context) if the
    /// engine cannot open a new session.
    pub fn scoped_context(&self) -> Result<ScopedContext> {
        let context = self.tracked.engine().open_context()?;
        log::trace!("Opened render context on engine {}", self.id());
        Ok(ScopedContext {
            context: Some(context),
            engine_id: self.id(),
        })
    }
}

impl std::ops::Deref for EngineHandle {
    type Target = dyn RenderEngine;

    fn deref(&self) -> &Self::Target {
        self.tracked.engine().as_ref()
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("id", &self.id())
            .field("age", &self.age())
            .finish()
    }
}

/// RAII guard for a per-request [`RenderContext`].
///
/// Closes the context on drop. Close failures are logged, never raised, so
/// they cannot mask the render's own outcome.
pub struct ScopedContext {
    /// `Option` so `Drop` can take it.
    context: Option<Box<dyn RenderContext>>,
    engine_id: u64,
}

impl std::ops::Deref for ScopedContext {
    type Target = dyn RenderContext;

    /// # Panics
    ///
    /// Never in practice: the context is only taken in `Drop`.
    fn deref(&self) -> &Self::Target {
        match &self.context {
            Some(context) => context.as_ref(),
            None => unreachable!("render context used after close"),
        }
    }
}

impl Drop for ScopedContext {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            match context.close() {
                Ok(()) => log::trace!("Closed render context on engine {}", self.engine_id),
                Err(e) => log::warn!(
                    "⚠️ Failed to close render context on engine {}: {}",
                    self.engine_id,
                    e
                ),
            }
        }
    }
}

impl std::fmt::Debug for ScopedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedContext")
            .field("engine_id", &self.engine_id)
            .field("open", &self.context.is_some())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
