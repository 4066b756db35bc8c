//! Convenient imports for common usage patterns.
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//! ```
//!
//! This imports the manager and its builder, the configuration types, the
//! Chrome launcher, the service with its request/response/error types, and
//! the crate's [`Result`] alias. With `env-config`, [`init_engine_manager`]
//! and [`from_env`] come along too.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_gateway::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = init_engine_manager()?;
//!     manager.warm().await;
//!
//!     let service = PdfService::with_env_api_key(manager.clone());
//!     let request = ConversionRequest {
//!         html_data: Some(vec!["PGgxPkhlbGxvPC9oMT4=".to_string()]),
//!         ..Default::default()
//!     };
//!     let pdf = service.generate(&request).await?;
//!     println!("{} bytes", pdf.size());
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

// Core types
pub use crate::config::{EngineConfig, EngineConfigBuilder, StaticApiKey};
pub use crate::engine::{ChromeEngineLauncher, EngineLauncher, PageFormat};
pub use crate::error::{EngineError, Result};
pub use crate::handle::EngineHandle;
pub use crate::manager::{RenderEngineManager, RenderEngineManagerBuilder, SharedEngineManager};
pub use crate::stats::{EngineState, EngineStats};
pub use crate::traits::Healthcheck;

// Service layer
pub use crate::service::{
    ConversionRequest, PdfResponse, PdfService, PdfServiceError, SharedPdfService,
};

// Feature-gated exports
#[cfg(feature = "env-config")]
pub use crate::config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use crate::manager::init_engine_manager;

// Re-export Arc for convenience (commonly needed with the Shared* aliases)
pub use std::sync::Arc;
