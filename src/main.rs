//! Category Crawler main entry point
//!
//! This is the command-line interface for the category crawler.

use anyhow::Context;
use category_crawler::config::{load_config_with_hash, Config};
use category_crawler::crawler::{expand_jobs, JobScheduler};
use category_crawler::output::{load_statistics, print_run_summary, print_statistics};
use category_crawler::storage::{PageStore, RunStatus, SqliteStorage};
use category_crawler::CrawlContext;
use clap::Parser;
use std::fs::OpenOptions;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Category Crawler: a polite, bounded-concurrency web crawler
///
/// Crawls every configured domain per category, records the title and a
/// short snippet of each page it visits, and stores them in SQLite. It
/// respects robots.txt, spaces requests to each domain, and stops each
/// domain at a page cap.
#[derive(Parser, Debug)]
#[command(name = "category-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite category web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// When `log_path` is set, events are mirrored to that file without ANSI
/// colors.
fn setup_logging(verbose: u8, quiet: bool, log_path: Option<&str>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("category_crawler=info,warn"),
            1 => EnvFilter::new("category_crawler=debug,info"),
            2 => EnvFilter::new("category_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Category Crawler Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Max pages per domain: {}", crawler.max_pages_per_domain);
    println!("  Request timeout: {}ms", crawler.request_timeout_ms);
    println!("  Politeness delay: {}ms", crawler.politeness_delay_ms);
    println!("  Workers per domain: {}", crawler.max_workers_per_domain);
    println!("  Concurrent domains: {}", crawler.max_global_workers);
    println!(
        "  Retries: {} (base delay {}ms)",
        crawler.max_retries, crawler.retry_base_delay_ms
    );
    println!("  Queue capacity: {}", crawler.queue_capacity);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(log_path) = &config.output.log_path {
        println!("  Log file: {}", log_path);
    }

    let jobs = expand_jobs(&config.categories);
    println!("\nCategories ({}):", config.categories.len());
    for (category, domains) in &config.categories {
        let active: Vec<_> = domains
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();
        println!("  - {} ({} domains)", category, active.len());
        for domain in active {
            println!("    * {}", domain);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start {} domain crawls", jobs.len());
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("failed to open database")?;
    let stats = load_statistics(&storage).context("failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let storage = Arc::new(
        SqliteStorage::new(Path::new(&config.output.database_path))
            .context("failed to open database")?,
    );

    let jobs = expand_jobs(&config.categories);
    tracing::info!(
        "Categories: {}, domain crawls: {}",
        config.categories.len(),
        jobs.len()
    );

    let run_id = storage.start_run(config_hash)?;
    tracing::info!("Starting crawl run {}", run_id);

    let ctx = CrawlContext::new(config.crawler.clone(), &config.user_agent, storage.clone())
        .context("failed to build crawl context")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let scheduler = JobScheduler::new(Arc::new(ctx));
    let summary = scheduler.run(jobs, &shutdown).await;

    let status = if shutdown.is_cancelled() {
        RunStatus::Interrupted
    } else {
        RunStatus::Completed
    };
    storage.finish_run(run_id, status, summary.pages_crawled as u64)?;

    tracing::info!(
        "Crawl run {} {}: {} pages across {} domains",
        run_id,
        status.to_db_string(),
        summary.pages_crawled,
        summary.domains_completed
    );
    print_run_summary(&summary);

    Ok(())
}

/// Cancels `shutdown` on Ctrl-C or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    cancel_on_signal(tokio::signal::ctrl_c(), terminate, &shutdown).await;
}

/// Cancels `shutdown` when either source fires
///
/// An interrupt source that fails to install is logged and the wait
/// continues on `terminate` alone.
async fn cancel_on_signal(
    interrupt: impl Future<Output = std::io::Result<()>>,
    terminate: impl Future<Output = ()>,
    shutdown: &CancellationToken,
) {
    let interrupt = async {
        if let Err(e) = interrupt.await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }

    tracing::warn!("Shutdown requested, letting in-flight work drain");
    shutdown.cancel();
}
