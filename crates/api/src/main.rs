//! CareLog - offline-first sync daemon
//!
//! Loads configuration, wires the services and runs the background drain,
//! backup and connectivity tasks until interrupted.

use std::sync::Arc;

use anyhow::Context as _;
use carelog_domain::Config;
use carelog_lib::utils::logging::init_tracing;
use carelog_lib::AppContext;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => info!(error = %err, "No .env file loaded"),
    }

    let config = match carelog_infra::config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "No usable configuration found, using defaults");
            Config::default()
        }
    };
    info!(data_dir = %config.storage.data_dir, remote = %config.remote.base_url, "CareLog starting...");

    let ctx = Arc::new(
        AppContext::new(config).await.context("failed to initialise application context")?,
    );
    ctx.start_background().await.context("failed to start background tasks")?;

    let status = ctx.sync.queue_status().await;
    info!(queued = status.total, failed = status.failed, "CareLog initialized successfully");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    ctx.shutdown().await;
    Ok(())
}
