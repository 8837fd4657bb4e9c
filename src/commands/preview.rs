//! Preview command implementation

use anyhow::{Context, Result};
use chrono::Utc;
use fix_mock_server::session::TracingSink;
use fix_mock_server::{Config, SessionContext};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub fn run(config_path: Option<PathBuf>, ticks_override: Option<u32>) -> Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(ticks) = ticks_override {
        config.schedule.tick_count = ticks;
    }
    config.validate().context("Invalid configuration")?;

    let ctx = SessionContext::from_config(&config, Arc::new(TracingSink));
    let (heartbeats, orders, executions) = ctx.schedule.totals();
    info!(
        "Rendering {} ticks: {} heartbeats, {} orders, {} executions",
        ctx.schedule.tick_count, heartbeats, orders, executions
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut skipped = 0usize;
    for message in ctx.render_session(Utc::now()) {
        match message {
            Ok(bytes) => out.write_all(&bytes)?,
            Err(e) => {
                warn!("Skipped message: {}", e);
                skipped += 1;
            }
        }
    }
    out.flush()?;

    if skipped > 0 {
        warn!("{} messages could not be encoded", skipped);
    }
    Ok(())
}
