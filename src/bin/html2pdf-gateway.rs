//! The gateway server.
//!
//! Run with:
//! ```bash
//! PDF_GENERATOR_API_KEY=s3cret cargo run --features server
//! ```
//!
//! Then post to `http://localhost:8080/api/pdf/generate`.

use html2pdf_gateway::config::env::server_config_from_env;
use html2pdf_gateway::init_engine_manager;
use html2pdf_gateway::integrations::axum::router_with_body_limit;
use html2pdf_gateway::{EnvApiKeySource, PdfService};
use tokio::signal;

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("🛑 Shutdown signal received, draining requests...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    // Loads app.env as a side effect, so it runs before anything reads the environment.
    let manager = init_engine_manager()?;
    let server = server_config_from_env();

    let api_keys = EnvApiKeySource::new();
    if std::env::var(api_keys.var_name()).map_or(true, |v| v.trim().is_empty()) {
        log::warn!(
            "⚠️ {} is not set; every conversion request will be rejected",
            api_keys.var_name()
        );
    }

    manager.spawn_warm();

    let service = PdfService::new(manager.clone(), std::sync::Arc::new(api_keys)).into_shared();
    let app = router_with_body_limit(service, server.body_limit);

    let listener = tokio::net::TcpListener::bind(&server.bind_addr).await?;
    log::info!("✅ Listening on http://{}", server.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    manager.shutdown().await;
    log::info!("Cleanup complete");

    served?;
    Ok(())
}
