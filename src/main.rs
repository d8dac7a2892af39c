//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, validate, Config};
use ripple_crawl::crawler::run_crawl;
use ripple_crawl::output::{print_statistics, ResultFormat, ResultWriter};
use ripple_crawl::url::RelativeLinks;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a bounded-depth concurrent web crawler
///
/// Starting from one URL, Ripple-Crawl fetches pages concurrently, follows
/// their links up to the maximum depth and prints one result per page it
/// fetched. Results appear in no particular order.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A bounded-depth concurrent web crawler", long_about = None)]
struct Cli {
    /// Starting URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Maximum link depth; 1 fetches only the starting URL (overrides the config file)
    #[arg(long)]
    depth: Option<u32>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve bare relative links against the page URL instead of passing them through
    #[arg(long)]
    resolve_relative: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = ResultFormat::Text)]
    format: ResultFormat,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    tracing::info!(
        "Crawling {} to depth {}",
        config.crawler.start_url,
        config.crawler.max_depth
    );

    let mut handle = run_crawl(&config).context("Failed to start crawl")?;

    let stdout = std::io::stdout();
    let mut writer = ResultWriter::new(stdout.lock(), cli.format);
    while let Some(result) = handle.recv().await {
        writer.write(&result).context("Failed to write result")?;
    }

    tracing::debug!("Wrote {} results", writer.written());
    print_statistics(&handle.statistics());
    Ok(())
}

/// Loads the config file if one was given and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.url {
        config.crawler.start_url = url.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if cli.resolve_relative {
        config.crawler.relative_links = RelativeLinks::Resolve;
    }

    validate(&config).context("Invalid crawl settings")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
