//! Fable Crawler main entry point
//!
//! This is the command-line interface for the Fable Crawler.

use clap::Parser;
use fable_crawler::config::{load_config_with_hash, Config};
use fable_crawler::crawler::{
    crawl_progress_bar, discover_story_links, run_crawl, HttpFetcher, PacingSchedule, Spider,
};
use fable_crawler::output::{load_statistics, print_statistics};
use fable_crawler::storage::open_storage;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Fable Crawler: a polite fable page collector
///
/// Reads the table of contents of a fable collection, then fetches every story
/// page one at a time, storing the raw page together with its paragraphs and
/// quotes. Requests are spaced out with fixed delays.
#[derive(Parser, Debug)]
#[command(name = "fable-crawler")]
#[command(version)]
#[command(about = "A polite fable page collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Story source to crawl
    #[arg(long, value_enum, default_value_t = Spider::Aesop)]
    spider: Spider,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the story links without fetching them
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the configured collection and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.spider).await?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, cli.spider, &config_hash, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fable_crawler=info,warn"),
            1 => EnvFilter::new("fable_crawler=debug,info"),
            2 => EnvFilter::new("fable_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and lists what would be crawled
async fn handle_dry_run(config: &Config, spider: Spider) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Fable Crawler Dry Run ===\n");

    println!("Source ({}):", spider);
    println!("  Table of contents: {}", config.source.index_url());
    println!("  Selector: {}", config.source.toc_selector);

    println!("\nPacing:");
    println!("  Delay after each page: {}ms", config.pacing.delay_ms);
    println!(
        "  Extra delay every {} pages: {}ms",
        config.pacing.batch_size, config.pacing.batch_delay_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.database.path);
    println!("  Collection: {}", config.database.collection);

    let fetcher = HttpFetcher::from_config(&config.user_agent)?;
    let links = discover_story_links(&config.source, &fetcher).await?;

    println!("\nStory links ({}):", links.len());
    for link in &links {
        println!("  - {}", link);
    }

    let schedule = PacingSchedule::from_config(&config.pacing);
    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} pages, spending at least {:?} waiting",
        links.len(),
        schedule.total_for(links.len())
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.database.path);

    let storage = open_storage(Path::new(&config.database.path), &config.database.collection)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// The first Ctrl-C stops the crawl after the current page; a second one exits immediately.
async fn handle_crawl(
    config: &Config,
    spider: Spider,
    config_hash: &str,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting {} crawl into {} ({})",
        spider,
        config.database.path,
        config.database.collection
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, stopping after the current page (Ctrl-C again to exit now)");
        let _ = shutdown_tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt received, exiting");
            std::process::exit(130);
        }
    });

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        crawl_progress_bar()
    };

    match run_crawl(config, spider, config_hash, Some(shutdown_rx), progress).await {
        Ok(report) if report.cancelled => {
            tracing::warn!(
                "Crawl interrupted: {} of {} pages stored",
                report.stored,
                report.links
            );
            Ok(())
        }
        Ok(report) => {
            tracing::info!("Crawl completed: {} pages stored", report.stored);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
