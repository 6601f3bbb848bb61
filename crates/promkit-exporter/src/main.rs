//! promkit exporter
//!
//! Serves the process registry over HTTP.
//! - Config: `$PROMKIT_CONFIG` (default `promkit.yaml`)
//! - Logging: `RUST_LOG` via tracing-subscriber's `EnvFilter`

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use promkit_core::Registry;
use promkit_exporter::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(kind = e.kind().as_str(), error = %e, "promkit-exporter failed");
        std::process::exit(1);
    }
}

async fn run() -> promkit_core::Result<()> {
    let path = std::env::var("PROMKIT_CONFIG").unwrap_or_else(|_| "promkit.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.exporter.listen_addr()?;
    let metrics_path = cfg.exporter.metrics_path.clone();

    let state = app_state::AppState::new(cfg, Arc::new(Registry::new()))?;
    let app = router::build_router(state);

    tracing::info!(%listen, %metrics_path, config = %path, "promkit-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("promkit-exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
}
