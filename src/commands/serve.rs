//! Serve command implementation

use anyhow::{Context, Result};
use fix_mock_server::session::TracingSink;
use fix_mock_server::{Config, ConnectionManager, SessionContext};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// CLI overrides, applied after the config file and environment
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tick_interval_ms: Option<u64>,
    pub ticks: Option<u32>,
}

pub fn run(args: ServeArgs) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { run_async(args).await })
}

async fn run_async(args: ServeArgs) -> Result<()> {
    info!("Starting FIX mock server");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(path) = &args.config {
        info!("Loaded configuration from: {}", path.display());
    }

    if let Some(host) = args.host {
        info!("Overriding host to: {}", host);
        config.server.host = host;
    }
    if let Some(port) = args.port {
        info!("Overriding port to: {}", port);
        config.server.port = port;
    }
    if let Some(interval) = args.tick_interval_ms {
        info!("Overriding tick interval to: {}ms", interval);
        config.schedule.tick_interval_ms = interval;
    }
    if let Some(ticks) = args.ticks {
        info!("Overriding tick count to: {}", ticks);
        config.schedule.tick_count = ticks;
    }

    config.validate().context("Invalid configuration")?;
    info!(
        "Session schedule: {} ticks every {}ms, orders every {} ticks, executions every {} ticks",
        config.schedule.tick_count,
        config.schedule.tick_interval_ms,
        config.schedule.order_every,
        config.schedule.execution_every
    );

    let ctx = Arc::new(SessionContext::from_config(&config, Arc::new(TracingSink)));
    let manager = ConnectionManager::bind(&config.server, ctx)
        .await
        .context("Failed to start listener")?;

    let shutdown = manager.shutdown_handle();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Ctrl+C received - initiating graceful shutdown");
                shutdown.trigger();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    manager.run().await;
    manager.shutdown().await;

    Ok(())
}
