//! Borsa Scraper main entry point
//!
//! This is the command-line interface for the periodic stock quote scraper.

use anyhow::Context;
use borsa_scraper::config::{load_config_with_hash, Config};
use borsa_scraper::extractor::Extractor;
use borsa_scraper::output::{load_statistics, print_statistics};
use borsa_scraper::pipeline::{run_cycle, scrape_job};
use borsa_scraper::scheduler::Scheduler;
use borsa_scraper::storage::SqliteStorage;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Borsa Scraper: a periodic stock quote collector
///
/// Fetches the live quotes page on a fixed interval and stores current
/// prices plus a price history in SQLite. Runs until interrupted.
#[derive(Parser, Debug)]
#[command(name = "borsa-scraper")]
#[command(version)]
#[command(about = "A periodic stock quote collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single scrape cycle and exit
    #[arg(long, conflicts_with = "stats")]
    once: bool,

    /// Show the stored quotes and exit
    #[arg(long, conflicts_with = "once")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_deref())?;

    if cli.stats {
        handle_stats(&config)
    } else if cli.once {
        handle_once(&config).await
    } else {
        handle_run(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("borsa_scraper=info,warn"),
            1 => EnvFilter::new("borsa_scraper=debug,info"),
            2 => EnvFilter::new("borsa_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    SqliteStorage::new(path, config.storage.default_quantity)
        .with_context(|| format!("failed to open database {}", path.display()))
}

/// Handles the --stats mode: prints what has been stored so far
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: a single cycle whose failure is the exit status
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let extractor = Extractor::new(&config.source.url, &config.http)?;
    let storage = Mutex::new(open_storage(config)?);

    let report = run_cycle(&extractor, &storage).await?;
    tracing::info!(
        outcome = "success",
        quotes = report.quotes,
        inserted = report.outcome.inserted,
        updated = report.outcome.updated,
        "Stocks have been upserted successfully"
    );

    extractor.close();
    Ok(())
}

/// Handles the default mode: scrape on an interval until interrupted
async fn handle_run(config: &Config) -> anyhow::Result<()> {
    let extractor = Arc::new(Extractor::new(&config.source.url, &config.http)?);
    let storage = Arc::new(Mutex::new(open_storage(config)?));

    if config.source.check_connectivity {
        extractor
            .check_connectivity()
            .await
            .context("source site is unreachable, not scheduling")?;
        tracing::info!(outcome = "success", url = %extractor.source(), "Connected to source site");
    }

    let mut scheduler = Scheduler::new();
    scheduler.register(
        "scrape-stocks",
        config.schedule.interval(),
        scrape_job(Arc::clone(&extractor), storage),
    )?;
    scheduler.start()?;

    tracing::info!(
        interval_secs = config.schedule.interval_secs,
        "Press Ctrl+C to stop the scheduler."
    );
    shutdown_signal().await?;

    tracing::warn!("Stopping the scheduler...");
    scheduler.stop().await;
    tracing::info!(outcome = "success", "The scheduler has been stopped.");

    // Jobs have exited; dropping them releases their extractor handles.
    drop(scheduler);
    match Arc::try_unwrap(extractor) {
        Ok(extractor) => extractor.close(),
        Err(_) => tracing::debug!("Extractor still shared at shutdown"),
    }

    Ok(())
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::warn!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate.recv() => {
                tracing::warn!("Received SIGTERM, initiating graceful shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::warn!("Received Ctrl+C, initiating graceful shutdown...");
    }

    Ok(())
}
