//! # html2pdf-gateway
//!
//! HTTP gateway that stitches base64 HTML fragments into one multi-page PDF
//! using a single shared, lifecycle-managed headless Chrome.
//!
//! A client posts an ordered list of base64-encoded HTML fragments, an
//! optional stylesheet, a filename and a page format. The gateway checks the
//! `X-Pdf-Api-Key` header, decodes the fragments, joins them with forced page
//! breaks into one document, renders it in a fresh tab of the shared engine
//! and streams the PDF back as an attachment.
//!
//! ## Features
//!
//! - **Single Shared Engine**: One browser process serves every request;
//!   each render gets its own tab, closed on every path
//! - **Lazy, Deduplicated Launch**: Concurrent first requests trigger exactly
//!   one launch; a dead engine is detected and relaunched
//! - **Cancellation-Safe Initialization**: Launch runs as a detached task,
//!   so a dropped request never strands the manager in `Initializing`
//! - **Constant-Time Access Check**: Keys are compared by SHA-256 digest
//! - **Bounded Work**: Launch, load, settle, render and shutdown all have
//!   timeouts
//! - **Web Framework Integration**: Axum (used by the bundled binary) and
//!   Actix-web
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │    integrations::axum / integrations::actix │
//! └─────────────────┬───────────────────────────┘
//!                   │ api key + raw body
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │               PdfService                    │
//! │  auth ──▶ parse ──▶ assembler ──▶ render    │
//! └─────────────────┬───────────────────────────┘
//!                   │ acquire()
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │           RenderEngineManager               │
//! │  Uninitialized → Initializing → Ready       │
//! │  [EngineHandle] ──▶ ScopedContext (tab)     │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │        Headless Chrome (one process)        │
//! │     (managed by headless_chrome crate)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = RenderEngineManager::builder()
//!         .config(
//!             EngineConfigBuilder::new()
//!                 .render_timeout(Duration::from_secs(30))
//!                 .build()?,
//!         )
//!         .launcher(Box::new(ChromeEngineLauncher::with_defaults()))
//!         .build()?
//!         .into_shared();
//!
//!     manager.spawn_warm();
//!
//!     let service = PdfService::with_env_api_key(manager.clone());
//!     let body = br#"{"htmlData":["PGgxPkhlbGxvPC9oMT4="],"fileName":"hello.pdf"}"#;
//!     let pdf = service.handle(Some("s3cret"), body).await?;
//!     std::fs::write(&pdf.filename, &pdf.data)?;
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Configuration
//!
//! With the `env-config` feature (default), [`init_engine_manager`] builds a
//! manager from `app.env` and the process environment:
//!
//! ```text
//! PDF_GENERATOR_API_KEY=s3cret
//! PDF_ENGINE_RENDER_TIMEOUT_SECONDS=60
//! CHROME_PATH=/usr/bin/chromium
//! ```
//!
//! See [`config::env`] for the full variable list.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `env-config` | Environment-based configuration (default) |
//! | `axum-integration` | Axum router and handlers |
//! | `actix-integration` | Actix-web handlers |
//! | `server` | The `html2pdf-gateway` binary |
//! | `test-utils` | Mock engine launcher for testing |
//!
//! ## Testing
//!
//! For testing without Chrome, enable the `test-utils` feature and use
//! [`MockEngineLauncher`](engine::mock::MockEngineLauncher):
//!
//! ```rust,ignore
//! use html2pdf_gateway::engine::mock::MockEngineLauncher;
//!
//! let manager = RenderEngineManager::builder()
//!     .launcher(Box::new(MockEngineLauncher::always_fails("no chrome here")))
//!     .build()?;
//! ```

#![doc(html_root_url = "https://docs.rs/html2pdf-gateway/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod assembler;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod manager;
pub mod prelude;
pub mod service;
pub mod stats;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod tracked;

// ============================================================================
// Feature-gated modules
// ============================================================================

/// Web framework integrations.
///
/// Enable the corresponding feature flag to use them:
///
/// - `actix-integration` for Actix-web
/// - `axum-integration` for Axum
#[cfg(any(feature = "actix-integration", feature = "axum-integration"))]
pub mod integrations;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

// Core types
pub use config::{ApiKeySource, EngineConfig, EngineConfigBuilder, EnvApiKeySource, StaticApiKey};
pub use engine::{
    ChromeEngineLauncher, EngineLauncher, PageFormat, PdfOptions, RenderContext, RenderEngine,
    create_chrome_options,
};
pub use error::{EngineError, Result};
pub use handle::{EngineHandle, ScopedContext};
pub use manager::{RenderEngineManager, RenderEngineManagerBuilder, SharedEngineManager};
pub use stats::{EngineState, EngineStats};
pub use traits::Healthcheck;

// Service layer
pub use service::{
    ConversionRequest, PdfEnvelope, PdfResponse, PdfService, PdfServiceError, SharedPdfService,
};

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use manager::init_engine_manager;
