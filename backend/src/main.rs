//! Main entry point for the Reparo backend.
//!
//! This file initializes tracing, loads the configuration, opens the storage
//! backend and starts the Axum web server with graceful shutdown on Ctrl-C.

use anyhow::Context;
use reparo_backend::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let state = reparo_backend::build_state(&config)
        .await
        .context("failed to initialise application state")?;
    let app = reparo_backend::build_app(state, &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, production = config.production, "Listening");

    reparo_backend::serve(listener, app, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
