//! Market-Mirror main entry point
//!
//! This is the command-line interface for the Market-Mirror catalogue crawler.

use anyhow::Context;
use clap::Parser;
use market_mirror::config::{load_config_with_hash, Config, CrawlerMode};
use market_mirror::crawler::{
    select_crawler, CrawlOptions, LocationFilterOutcome, LocationForm, PageCache, UpstreamClient,
};
use market_mirror::output::{print_index_summary, print_report, publish_index};
use market_mirror::storage::{BlobStore, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Market-Mirror: a resource-bounded marketplace catalogue crawler
///
/// Market-Mirror fetches seller profiles and item reviews from a set of
/// candidate hosts with failover, extracts seller details, and publishes
/// aggregated seller and image indexes into a SQLite blob store.
#[derive(Parser, Debug)]
#[command(name = "market-mirror")]
#[command(version = "1.0.0")]
#[command(about = "A resource-bounded marketplace catalogue crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "publish")]
    dry_run: bool,

    /// Publish the seller and image indexes from stored data and exit
    #[arg(long, conflicts_with = "dry_run")]
    publish: bool,

    /// Seller ids or item refs to crawl instead of the configured seeds
    #[arg(long = "target", value_name = "ID")]
    targets: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.targets);
    } else if cli.publish {
        handle_publish(&config)?;
    } else {
        handle_crawl(&config, cli.targets).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("market_mirror=info,warn"),
            1 => EnvFilter::new("market_mirror=debug,info"),
            2 => EnvFilter::new("market_mirror=trace,debug"),
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

/// Targets from the command line, or the seeds for the configured mode
fn resolve_targets(config: &Config, targets: Vec<String>) -> Vec<String> {
    if !targets.is_empty() {
        return targets;
    }
    match config.crawler.mode {
        CrawlerMode::Sellers => config.seeds.sellers.clone(),
        CrawlerMode::Reviews => config.seeds.items.clone(),
    }
}

fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    SqliteStore::new(Path::new(&config.output.database_path))
        .with_context(|| format!("opening blob store {}", config.output.database_path))
}

/// Handles the --dry-run mode: shows the parsed configuration
fn handle_dry_run(config: &Config, targets: &[String]) {
    println!("=== Market-Mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Mode: {:?}", config.crawler.mode);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Max bytes: {}", config.crawler.max_bytes);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!(
        "  Early abort: {} (after {} bytes)",
        config.crawler.early_abort, config.crawler.early_abort_min_bytes
    );
    println!(
        "  Review pages: {} x {}",
        config.crawler.max_review_pages, config.crawler.review_page_size
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nHosts ({}):", config.hosts.candidates.len());
    for host in &config.hosts.candidates {
        println!("  - {}", host);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    match &config.location {
        Some(location) => println!("\nLocation filter: ships to {}", location.ships_to),
        None => println!("\nLocation filter: none"),
    }

    let targets = resolve_targets(config, targets.to_vec());
    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} targets", targets.len());
    for target in &targets {
        println!("    * {}", target);
    }
}

/// Handles the --publish mode: rebuilds the published indexes
fn handle_publish(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let summary = publish_index(&store).context("publishing index")?;
    print_index_summary(&summary);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, targets: Vec<String>) -> anyhow::Result<()> {
    let targets = resolve_targets(config, targets);
    if targets.is_empty() {
        anyhow::bail!("no targets: pass --target or configure [seeds]");
    }

    let store: Arc<dyn BlobStore> = Arc::new(open_store(config)?);
    let cache = Arc::new(PageCache::new(Duration::from_secs(
        config.crawler.cache_ttl_secs,
    )));
    let upstream = Arc::new(UpstreamClient::from_config(config, cache)?);

    if let Some(location) = &config.location {
        match upstream.apply_location_filter(&LocationForm::from(location)).await {
            Ok(LocationFilterOutcome::Applied { status }) => {
                tracing::info!("Location filter applied (HTTP {})", status)
            }
            Ok(LocationFilterOutcome::Redirected { status, location }) => tracing::warn!(
                "Location filter redirected (HTTP {}) to {}",
                status,
                location.as_deref().unwrap_or("<none>")
            ),
            Err(e) => tracing::warn!("Location filter failed: {}", e),
        }
    }

    let crawler = select_crawler(config, upstream, store)?;
    let report = crawler
        .run(&CrawlOptions { targets })
        .await
        .map_err(|e| {
            tracing::error!("Crawl failed: {}", e);
            e
        })?;

    print_report(&report);
    Ok(())
}
