//! Engine lifecycle state and statistics for monitoring and health checks.
//!
//! This module provides [`EngineState`], the manager's lifecycle state
//! machine, and [`EngineStats`], a snapshot of the manager at a point in
//! time.
//!
//! # Example
//!
//! ```rust,ignore
//! let stats = manager.stats();
//! println!("{}", stats);
//! if !stats.is_ready() {
//!     log::warn!("Engine not ready: {}", stats.state);
//! }
//! ```

use std::time::Duration;

use serde::Serialize;

/// Lifecycle state of the shared engine.
///
/// ```text
/// Uninitialized ──acquire──▶ Initializing ──ok──▶ Ready
///       ▲                         │                 │
///       └──────── launch failed ──┘     ping failed ─┤ (relaunch)
///                                                    │
/// Closed ◀─────────────── shutdown ──────────────────┘
/// ```
///
/// A failed liveness probe while `Ready` is the transient "degraded"
/// condition; it is never stored, the next acquisition relaunches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// No engine has been launched, or the last launch failed.
    Uninitialized,
    /// A launch is in progress.
    Initializing,
    /// An engine is running and was healthy at its last probe.
    Ready,
    /// Shut down; the next acquisition launches a fresh engine.
    Closed,
}

impl EngineState {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            EngineState::Uninitialized => 0,
            EngineState::Initializing => 1,
            EngineState::Ready => 2,
            EngineState::Closed => 3,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineState::Initializing,
            2 => EngineState::Ready,
            3 => EngineState::Closed,
            _ => EngineState::Uninitialized,
        }
    }

    /// Lowercase name, as reported by the health endpoints.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Initializing => "initializing",
            EngineState::Ready => "ready",
            EngineState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the engine manager at a point in time.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `state` | Lifecycle state |
/// | `launches` | Successful launches since the manager was created |
/// | `engine_id` | ID of the running engine, if any |
/// | `uptime` | Time since the running engine was launched |
///
/// # Example
///
/// ```rust
/// use html2pdf_gateway::{EngineState, EngineStats};
///
/// let stats = EngineStats {
///     state: EngineState::Ready,
///     launches: 1,
///     engine_id: Some(0),
///     uptime: None,
/// };
///
/// assert!(stats.is_ready());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    /// Current lifecycle state.
    ///
    /// May change immediately after reading.
    pub state: EngineState,

    /// Engines launched so far. More than one means the engine was
    /// relaunched after a crash or a shutdown.
    pub launches: u64,

    /// ID of the engine currently published, if any.
    pub engine_id: Option<u64>,

    /// Age of the engine currently published, if any.
    pub uptime: Option<Duration>,
}

impl EngineStats {
    /// Whether an engine is published and was healthy at its last probe.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }

    /// Number of times the engine was replaced after the first launch.
    #[inline]
    pub fn relaunches(&self) -> u64 {
        self.launches.saturating_sub(1)
    }
}

impl std::fmt::Display for EngineStats {
    /// ```rust
    /// use html2pdf_gateway::{EngineState, EngineStats};
    ///
    /// let stats = EngineStats {
    ///     state: EngineState::Closed,
    ///     launches: 2,
    ///     engine_id: None,
    ///     uptime: None,
    /// };
    ///
    /// assert_eq!(stats.to_string(), "EngineStats { state: closed, launches: 2, engine: none }");
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EngineStats {{ state: {}, launches: {}, engine: ", self.state, self.launches)?;
        match (self.engine_id, self.uptime) {
            (Some(id), Some(uptime)) => write!(f, "{} up {}s }}", id, uptime.as_secs()),
            (Some(id), None) => write!(f, "{} }}", id),
            _ => write!(f, "none }}"),
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
    fn test_state_u8_round_trip() {
        for state in [
            EngineState::Uninitialized,
            EngineState::Initializing,
            EngineState::Ready,
            EngineState::Closed,
        ] {
            assert_eq!(EngineState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn test_unknown_u8_is_uninitialized() {
        assert_eq!(EngineState::from_u8(42), EngineState::Uninitialized);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&EngineState::Initializing).unwrap();
        assert_eq!(json, "\"initializing\"");
    }

    #[test]
    fn test_relaunches() {
        let mut stats = EngineStats {
            state: EngineState::Uninitialized,
            launches: 0,
            engine_id: None,
            uptime: None,
        };
        assert_eq!(stats.relaunches(), 0);

        stats.launches = 3;
        assert_eq!(stats.relaunches(), 2);
    }

    #[test]
    fn test_display_with_engine() {
        let stats = EngineStats {
            state: EngineState::Ready,
            launches: 1,
            engine_id: Some(7),
            uptime: Some(Duration::from_secs(90)),
        };
        assert_eq!(
            stats.to_string(),
            "EngineStats { state: ready, launches: 1, engine: 7 up 90s }"
        );
    }
}
