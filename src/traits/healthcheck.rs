//! Health check trait for rendering engines.
//!
//! This module provides the [`Healthcheck`] trait, which defines how an
//! engine verifies that it is still connected and responsive.
//!
//! # Overview
//!
//! The [`RenderEngineManager`](crate::RenderEngineManager) probes the shared
//! engine every time a handle is requested. A failed probe is the implicit
//! `Degraded` state: the manager discards the engine and launches a new one.
//!
//! # Default Implementation
//!
//! The Chrome engine implements this trait by asking the browser for its
//! version over the DevTools connection. This is a single round trip that
//! verifies the process is alive and the connection still works.

use crate::error::Result;

/// Trait for engine-like objects that support liveness probing.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because the shared engine is probed
/// from whichever task happens to be acquiring it.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use html2pdf_gateway::{EngineError, Healthcheck, Result};
///
/// struct RemoteEngine {
///     client: SomeClient,
/// }
///
/// impl Healthcheck for RemoteEngine {
///     fn ping(&self) -> Result<()> {
///         self.client
///             .version()
///             .map(|_| ())
///             .map_err(|e| EngineError::HealthCheckFailed(e.to_string()))
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Perform a liveness probe on the engine.
    ///
    /// # Implementation Guidelines
    ///
    /// - **Keep it fast**: it runs on every acquisition
    /// - **No side effects**: do not open contexts that outlive the call
    /// - **Be idempotent**: multiple calls must be safe
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::HealthCheckFailed`](crate::EngineError::HealthCheckFailed)
    /// if the engine is unresponsive or its connection is gone.
    fn ping(&self) -> Result<()>;
}
