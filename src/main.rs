//! FIX mock server - main entry point
//!
//! This binary provides two subcommands:
//! - serve: Accept FIX clients and stream the scheduled traffic
//! - preview: Print the messages one session would receive

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "fix-mock-server")]
#[command(about = "Mock FIX 4.2 counterparty for client connectivity testing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the server until Ctrl+C
    Serve {
        /// Path to JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen host (overrides config and FIX_MOCK_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config and FIX_MOCK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Milliseconds between ticks
        #[arg(long)]
        tick_interval_ms: Option<u64>,

        /// Number of ticks per session
        #[arg(long)]
        ticks: Option<u32>,

        /// Directory for log files
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },

    /// Print one session's messages to stdout without networking
    Preview {
        /// Path to JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of ticks to render
        #[arg(long)]
        ticks: Option<u32>,

        /// Directory for log files
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },
}

fn setup_logging(verbose: bool, log_dir: &Path, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = log_dir.join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // File appender
    let file_appender = tracing_appender::rolling::never(log_dir, &log_filename);

    if file_only {
        // stdout carries only the rendered messages
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        // File layer - same format but without ANSI colors
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (command_name, log_dir, file_only) = match &cli.command {
        Commands::Serve { log_dir, .. } => ("serve", log_dir.clone(), false),
        Commands::Preview { log_dir, .. } => ("preview", log_dir.clone(), true),
    };

    setup_logging(cli.verbose, &log_dir, command_name, file_only)?;

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            tick_interval_ms,
            ticks,
            log_dir: _,
        } => commands::serve::run(commands::serve::ServeArgs {
            config,
            host,
            port,
            tick_interval_ms,
            ticks,
        }),

        Commands::Preview {
            config,
            ticks,
            log_dir: _,
        } => commands::preview::run(config, ticks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_args() {
        let cli = Cli::try_parse_from([
            "fix-mock-server",
            "-v",
            "serve",
            "--port",
            "10001",
            "--ticks",
            "6",
            "--log-dir",
            "/tmp/fix-logs",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve {
                port,
                ticks,
                log_dir,
                host,
                ..
            } => {
                assert_eq!(port, Some(10001));
                assert_eq!(ticks, Some(6));
                assert_eq!(host, None);
                assert_eq!(log_dir, PathBuf::from("/tmp/fix-logs"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_preview_log_dir() {
        let cli = Cli::try_parse_from(["fix-mock-server", "preview", "--ticks", "2"]).unwrap();
        match cli.command {
            Commands::Preview { ticks, log_dir, .. } => {
                assert_eq!(ticks, Some(2));
                assert_eq!(log_dir, PathBuf::from("logs"));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["fix-mock-server", "preview", "--log-dir", "/tmp/preview"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Preview { ref log_dir, .. } if log_dir.as_path() == Path::new("/tmp/preview")
        ));
    }

    // Installs the global subscriber, so this is the only test that calls it
    #[test]
    fn test_setup_logging_writes_to_log_dir() {
        let log_dir = std::env::temp_dir().join(format!("fix_mock_logs_{}", std::process::id()));
        setup_logging(false, &log_dir, "preview", true).unwrap();
        tracing::info!("file only");

        let files: Vec<_> = std::fs::read_dir(&log_dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("preview_"))
            .collect();
        std::fs::remove_dir_all(&log_dir).ok();
        assert_eq!(files.len(), 1);
    }
}
