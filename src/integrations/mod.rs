//! Web framework integrations.
//!
//! Thin HTTP adapters over [`PdfService`](crate::service::PdfService). Each
//! one extracts the `X-Pdf-Api-Key` header and the raw body, delegates, and
//! maps the result to a PDF attachment or a JSON envelope.
//!
//! # Available Integrations
//!
//! | Framework | Feature Flag | Module |
//! |-----------|--------------|--------|
//! | Axum | `axum-integration` | `axum` |
//! | Actix-web | `actix-integration` | `actix` |
//!
//! # Enabling Integrations
//!
//! ```toml
//! [dependencies]
//! html2pdf-gateway = { version = "0.1", features = ["actix-integration"] }
//! ```
//!
//! # Common Pattern
//!
//! 1. Build a [`RenderEngineManager`](crate::RenderEngineManager) and start
//!    warming it in the background
//! 2. Wrap it in a [`PdfService`](crate::service::PdfService) and share it
//! 3. Register the routes with your framework
//! 4. After the server stops, await
//!    [`shutdown`](crate::RenderEngineManager::shutdown)

#[cfg(feature = "actix-integration")]
pub mod actix;

#[cfg(feature = "axum-integration")]
pub mod axum;
