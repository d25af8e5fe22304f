mod menu;

use crate::menu::{Menu, OutputFormat};

use clap::Parser;
use employee_tracker::config::{Config, RawConfig};
use employee_tracker::tracker::EmployeeTracker;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Interactive tracker for departments, roles and employees.
#[derive(Debug, Parser)]
#[command(name = "employee-tracker", version, about)]
struct Args {
    /// Drop and recreate every table on startup
    #[arg(long)]
    recreate: bool,

    /// Insert the seed rows after ensuring the tables
    #[arg(long)]
    seed: bool,

    /// Exit after table setup instead of starting the menu
    #[arg(long)]
    setup_only: bool,

    /// How query results are printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment from .env file if present
    let dotenv = dotenvy::dotenv();

    let raw = RawConfig::from_env();
    let _guard = init_logging(raw.log_dir.as_deref().filter(|d| !d.trim().is_empty()));

    if let Err(e) = dotenv {
        debug!("No .env file found or error loading it: {}", e);
    }

    let config = Config::validate(raw).map_err(|e| {
        error!("{}", e);
        e
    })?;
    info!(
        "Connecting to {}:{} as {} (database {})",
        config.host, config.port, config.user, config.database
    );

    let tracker = EmployeeTracker::connect(&config).await.map_err(|e| {
        error!("Startup failed: {}", e);
        e
    })?;

    let results = tracker.setup(args.recreate, args.seed).await.map_err(|e| {
        error!("Table setup failed: {}", e);
        e
    })?;
    for result in &results {
        debug!(
            table = %result.table,
            existed = result.existed,
            created = result.created,
            seeded = result.seeded,
            "table ready"
        );
    }

    if args.setup_only {
        info!("Setup complete, exiting");
        return Ok(());
    }

    let mut menu = Menu::new(tracker, args.format)?;
    menu.run().await?;

    Ok(())
}

/// Console logging to stderr, plus JSON file logging with daily rotation
/// when a log directory is configured.
fn init_logging(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            // Create log directory if it doesn't exist
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Warning: Could not create log directory {}: {}", dir, e);
            }

            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, Path::new(dir), "employee-tracker.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,employee_tracker=info")),
        )
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        debug!("Logging initialized - log directory: {}", dir);
    }

    guard
}
