//! Traits for abstraction and extensibility.
//!
//! - **Health monitoring**: [`Healthcheck`] for verifying the engine is alive
//!
//! Every [`RenderEngine`](crate::engine::RenderEngine) is a [`Healthcheck`],
//! so custom engines only need to say how to probe themselves:
//!
//! ```rust,ignore
//! use html2pdf_gateway::{Healthcheck, Result};
//!
//! impl Healthcheck for MyEngine {
//!     fn ping(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

mod healthcheck;

pub use healthcheck::Healthcheck;
