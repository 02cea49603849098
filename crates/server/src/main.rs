//! Metadata register server.
//!
//! Stores versioned snapshots of resources and serves them over HTTP.

use clap::Parser;
use register_persistence::backends::open_repository;
use register_rest::{ServerConfig, create_app_with_config, init_logging};
use tokio::signal;
use tracing::{info, warn};

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        concurrency = %config.concurrency,
        "Starting metadata register"
    );

    let repository = open_repository(&config.repository_config())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open repository: {}", e))?;

    let app = create_app_with_config(repository, config.clone());
    serve(app, &config).await
}
