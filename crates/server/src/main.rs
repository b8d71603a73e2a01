// crates/server/src/main.rs
//! dummybox server binary.
//!
//! Loads configuration, installs logging and metrics, then serves until
//! SIGINT/SIGTERM. On shutdown every background job is cancelled.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dummybox_server::{create_app, init_metrics, AppState, Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli).context("invalid configuration")?;

    dummybox_observability::init_tracing(&config.log_level)?;
    init_metrics();

    let port = config.port;
    tracing::info!(
        port,
        metrics_path = %config.metrics_path,
        auth = config.auth_enabled(),
        kill_dry_run = config.kill_dry_run,
        version = env!("CARGO_PKG_VERSION"),
        "starting dummybox"
    );

    let state = AppState::new(config);
    let app = create_app(Arc::clone(&state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let cancelled = state.shutdown();
    tracing::info!(cancelled, "shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
