//! Corpinfo main entry point

use clap::Parser;
use corpinfo::config::load_config;
use corpinfo::crawler::CrawlContext;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Corpinfo: a resilient corporate-registry crawler
///
/// Walks the three-level administrative-region hierarchy of the configured
/// registry site, then the paginated corporate listings under each leaf
/// region, routing all traffic through a pool of ephemeral egress endpoints.
#[derive(Parser, Debug)]
#[command(name = "corpinfo")]
#[command(version = "1.0.0")]
#[command(about = "A resilient corporate-registry crawler", long_about = None)]
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
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show record counts from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.stats {
        return handle_stats(&config);
    }

    handle_crawl(&config).await
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("corpinfo=info,warn"),
            1 => EnvFilter::new("corpinfo=debug,info"),
            2 => EnvFilter::new("corpinfo=trace,debug"),
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

/// Handles --dry-run: validates config and shows the crawl plan
fn handle_dry_run(config: &corpinfo::Config) {
    println!("=== Corpinfo Dry Run ===\n");

    println!("Pipeline:");
    println!("  Rate limit: {} req/s", config.crawler.rate_limit);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Endpoint pool size: {}", config.crawler.pool_size);

    println!("\nTarget:");
    println!("  Domain: {}", config.target.domain);
    println!("  Scheme: {}", config.target.scheme);

    println!("\nProvisioner:");
    println!("  Base URL: {}", config.provisioner.base_url);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints record counts from the database
fn handle_stats(config: &corpinfo::Config) -> anyhow::Result<()> {
    use corpinfo::storage::{SqliteStorage, Storage};
    use std::path::Path;

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    println!("Database: {}\n", config.output.database_path);
    println!("Regions: {}", storage.region_count()?);
    for level in 1..=3 {
        println!("  Level {}: {}", level, storage.regions_at_level(level)?.len());
    }
    println!("Corporate records: {}", storage.corporate_count()?);

    Ok(())
}

/// Handles the main crawl, including interrupt teardown
async fn handle_crawl(config: &corpinfo::Config) -> anyhow::Result<()> {
    let context = CrawlContext::initialize(config).await?;

    let interrupted = tokio::select! {
        outcome = context.run() => {
            match outcome {
                Ok(()) => false,
                Err(e) => {
                    tracing::error!("Crawl failed: {}", e);
                    context.shutdown().await;
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, tearing down endpoints");
            true
        }
    };

    context.shutdown().await;

    if interrupted {
        // The crawl did not complete; exit non-zero after cleanup.
        return Err(corpinfo::CrawlError::Interrupted.into());
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}
