//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the catalog record extractor.

use catalog_harvest::config::{load_config_with_hash, revalidate_crawler, Config};
use catalog_harvest::crawler::run_harvest;
use catalog_harvest::output::print_statistics;
use catalog_harvest::FieldSchema;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resilient catalog record extractor
///
/// Catalog-Harvest walks the list pages of a paginated catalog, visits every
/// item, extracts the configured fields and writes them as one table. The
/// table is written even when the run is interrupted or fails part way.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient catalog record extractor", long_about = None)]
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

    /// Validate config and show the crawl plan without crawling
    #[arg(long)]
    dry_run: bool,

    /// Write the export here instead of the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// First list page to visit
    #[arg(long, value_name = "N")]
    start_page: Option<u32>,

    /// Last list page to visit
    #[arg(long, value_name = "N")]
    page_ceiling: Option<u32>,
}

const EXIT_PAGE_LOAD_FAILED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = apply_overrides(&mut config, &cli) {
        tracing::error!("Invalid command-line override: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    handle_harvest(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), catalog_harvest::ConfigError> {
    if let Some(output) = &cli.output {
        tracing::info!("Export path overridden: {}", output.display());
        config.output.path = output.display().to_string();
    }
    if let Some(start_page) = cli.start_page {
        config.crawler.start_page = start_page;
    }
    if let Some(page_ceiling) = cli.page_ceiling {
        config.crawler.page_ceiling = Some(page_ceiling);
    }
    revalidate_crawler(&config.crawler)
}

/// Handles the --dry-run mode: shows the crawl plan and the export header
fn handle_dry_run(config: &Config) {
    let schema = FieldSchema::from_config(&config.schema);

    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start page: {}", config.crawler.start_page);
    match config.crawler.page_ceiling {
        Some(ceiling) => println!("  Page ceiling: {}", ceiling),
        None => println!("  Page ceiling: none (until the catalog ends)"),
    }
    println!("  Items per page: {}", config.crawler.items_per_page);
    println!(
        "  Attempts per step: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    println!("  Ready timeout: {}ms", config.crawler.ready_timeout_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  First list page: {}", config.site.list_url_for(config.crawler.start_page));
    println!("  Pagination: {:?}", config.site.pagination);

    println!("\nOutput:");
    println!("  Export: {} ({:?})", config.output.path, config.output.format);
    println!("  Missing value: {:?}", config.output.missing_value);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nColumns ({}):", schema.columns().len());
    for column in schema.columns() {
        println!("  - {}", column);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest and maps its outcome to an exit status
async fn handle_harvest(config: &Config, quiet: bool) -> ExitCode {
    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    match run_harvest(config, cancel).await {
        Ok(report) => {
            if !quiet {
                print_statistics(&report.stats);
            }
            if report.outcome.is_success() {
                tracing::info!(
                    "Harvest finished ({}): {} records in {}",
                    report.outcome.as_str(),
                    report.records,
                    report.export_path.display()
                );
                ExitCode::SUCCESS
            } else {
                tracing::error!(
                    "Harvest stopped early ({}): {} records in {}",
                    report.outcome.as_str(),
                    report.records,
                    report.export_path.display()
                );
                ExitCode::from(EXIT_PAGE_LOAD_FAILED)
            }
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Cancels `cancel` on Ctrl-C or SIGTERM
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::warn!("Interrupt received, stopping after the current step");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::warn!("Cannot listen for SIGTERM: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
