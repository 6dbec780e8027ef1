//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest series downloader.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{load_config_with_hash, validate, Config};
use page_harvest::pipeline::{print_summary, run_series};
use page_harvest::series::ItemLocator;
use page_harvest::SeriesId;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: download a numbered page series and bind it into a PDF
///
/// Pages are fetched in parallel until the source reports that a page does
/// not exist. Pages already on disk are not downloaded again, so an
/// interrupted run can simply be started again.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version)]
#[command(about = "Download a numbered page series and bind it into a PDF", long_about = None)]
struct Cli {
    /// Identifier of the series to download (exactly 4 bytes)
    #[arg(value_name = "SERIES_ID")]
    series_id: String,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// If set, no PDF is generated
    #[arg(long)]
    no_pdf: bool,

    /// Number of workers that generate PDF chunks; reduce if memory is short
    #[arg(long, value_name = "N")]
    pdf_workers: Option<usize>,

    /// Number of pages downloaded in parallel
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Base URL of the page source
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Directory in which the series folder is created
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Show the resolved configuration without downloading anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if self.no_pdf {
            config.document.enabled = false;
        }
        if let Some(workers) = self.pdf_workers {
            config.document.workers = workers;
        }
        if let Some(workers) = self.workers {
            config.download.workers = workers;
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let series = SeriesId::new(&cli.series_id)?;

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config)?;

    if cli.dry_run {
        return handle_dry_run(&config, series);
    }

    handle_run(&config, series).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be downloaded
fn handle_dry_run(config: &Config, series: SeriesId) -> anyhow::Result<()> {
    let locator = ItemLocator::new(&config.source.base_url, series.clone())?;

    println!("=== Page-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  First page: {}", locator.item_url(1));
    println!("  Request timeout: {}s", config.source.request_timeout_secs);
    println!("  Connect timeout: {}s", config.source.connect_timeout_secs);
    println!("  User agent: {}", config.source.user_agent);

    println!("\nDownload:");
    println!("  Workers: {}", config.download.workers);
    println!(
        "  Directory: {}",
        config.output.directory.join(series.as_str()).display()
    );

    println!("\nDocument:");
    if config.document.enabled {
        println!("  Batch size: {}", config.document.batch_size);
        println!("  Workers: {}", config.document.workers);
        println!("  Output: {}", config.document.output_name);
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main download operation
async fn handle_run(config: &Config, series: SeriesId) -> anyhow::Result<()> {
    match run_series(config, series.clone()).await {
        Ok(summary) => {
            tracing::info!("Run for series {} completed successfully", series);
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run for series {} failed: {}", series, e);
            Err(e.into())
        }
    }
}
