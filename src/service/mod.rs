//! Conversion service module.
//!
//! This module provides the **framework-agnostic core** of the gateway: the
//! request/response types, the error taxonomy with its HTTP mapping, and
//! [`PdfService`], which runs a request from access check to PDF bytes.
//!
//! # Module Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  service module (this module)                    │
//! │                                                                  │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────┐  │
//! │  │        types.rs          │  │           pdf.rs             │  │
//! │  │  ConversionRequest       │  │  PdfService::handle()        │  │
//! │  │  PdfResponse             │  │  PdfService::generate()      │  │
//! │  │  PdfEnvelope             │  │  PdfService::engine_status() │  │
//! │  │  PdfServiceError         │  │  parse_request()             │  │
//! │  │  HealthResponse          │  │                              │  │
//! │  │  EngineStatusResponse    │  │                              │  │
//! │  └──────────────────────────┘  └──────────────────────────────┘  │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ used by
//!                                 ▼
//!                ┌────────────────────────────────┐
//!                │  integrations (axum / actix)   │
//!                └────────────────────────────────┘
//! ```
//!
//! # Design Philosophy
//!
//! **Thin handler, thick service**: handlers only extract the API key header
//! and the raw body, call [`PdfService::handle`], and map the result to an
//! HTTP response. Everything else lives here, so it can be tested without
//! HTTP.
//!
//! # Error Handling
//!
//! ```rust,ignore
//! use html2pdf_gateway::service::{PdfEnvelope, PdfServiceError};
//!
//! fn to_http(error: &PdfServiceError) -> (u16, PdfEnvelope) {
//!     (error.status_code(), PdfEnvelope::from(error))
//! }
//! ```

mod pdf;
mod types;

pub use types::ConversionRequest;
pub use types::EngineStatusResponse;
pub use types::HealthResponse;
pub use types::PdfEnvelope;
pub use types::PdfResponse;
pub use types::PdfServiceError;
pub use types::DEFAULT_FILENAME;

pub use pdf::parse_request;
pub use pdf::PdfService;
pub use pdf::SharedPdfService;
