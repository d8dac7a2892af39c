//! Crawler module for concurrent page fetching and analysis
//!
//! This module contains the core crawling logic, including:
//! - The fetch capability and its HTTP implementation
//! - HTML link extraction
//! - URL admission (dedup gate) and completion tracking
//! - Crawl orchestration and the analysis stage
//!
//! Data flows start URL → dedup gate → coordinator → crawl task → fetcher →
//! page stream → analysis stage → result stream, with each crawl task feeding
//! its page's links back into the dedup gate until the depth limit.

mod analysis;
mod coordinator;
mod dedup;
mod fetcher;
mod parser;
mod tracker;

pub use analysis::{AnalysisError, AnalysisStage, Analyzer, CrawlResult, UrlAnalyzer};
pub use coordinator::{Coordinator, CrawlContext, CrawlTask};
pub use dedup::DedupGate;
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher, Page};
pub use parser::extract_links;
pub use tracker::CompletionTracker;

use crate::config::{validate, Config, CrawlerConfig};
use crate::output::{CrawlStatistics, StatisticsSnapshot};
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runtime parameters of one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// URL crawled at depth 1
    pub start_url: String,

    /// Deepest level that is fetched; pages at this depth are not expanded
    pub max_depth: u32,

    /// Capacity of the page stream
    pub page_buffer: usize,

    /// Capacity of the result stream
    pub result_buffer: usize,
}

impl CrawlSettings {
    /// Settings with the given start and depth and single-slot streams
    pub fn new(start_url: impl Into<String>, max_depth: u32) -> Self {
        Self {
            start_url: start_url.into(),
            max_depth,
            page_buffer: 1,
            result_buffer: 1,
        }
    }
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            start_url: config.start_url.clone(),
            max_depth: config.max_depth,
            page_buffer: config.page_buffer,
            result_buffer: config.result_buffer,
        }
    }
}

/// Handle to a running crawl
///
/// Results arrive in no particular order. `recv` returning `None` means both
/// the crawl and the analysis have fully drained.
pub struct CrawlHandle {
    results: mpsc::Receiver<CrawlResult>,
    stats: Arc<CrawlStatistics>,
}

impl CrawlHandle {
    /// Waits for the next result; `None` once the run is over
    pub async fn recv(&mut self) -> Option<CrawlResult> {
        self.results.recv().await
    }

    /// Drains the run and returns every result
    pub async fn collect(mut self) -> Vec<CrawlResult> {
        let mut results = Vec::new();
        while let Some(result) = self.recv().await {
            results.push(result);
        }
        results
    }

    /// Current counter values for this run
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }
}

/// Starts a crawl and its analysis stage on the current tokio runtime
///
/// Every call gets its own visited set and in-flight count, so concurrent or
/// repeated runs are independent.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::Config;
/// use ripple_crawl::crawler::{crawl, CrawlSettings, HttpFetcher, UrlAnalyzer};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::from_config(&Config::default())?;
/// let mut handle = crawl(
///     CrawlSettings::new("https://golang.org/", 2),
///     Arc::new(fetcher),
///     Arc::new(UrlAnalyzer),
/// );
/// while let Some(result) = handle.recv().await {
///     println!("Result: {}", result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub fn crawl(
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    analyzer: Arc<dyn Analyzer>,
) -> CrawlHandle {
    let stats = Arc::new(CrawlStatistics::new());

    let (pages_tx, pages_rx) = mpsc::channel(settings.page_buffer.max(1));
    let (results_tx, results_rx) = mpsc::channel(settings.result_buffer.max(1));

    let coordinator = Coordinator::new(&settings, fetcher, pages_tx, Arc::clone(&stats));
    let stage = AnalysisStage::new(analyzer, Arc::clone(&stats));

    tokio::spawn(coordinator.run());
    tokio::spawn(stage.run(pages_rx, results_tx));

    CrawlHandle {
        results: results_rx,
        stats,
    }
}

/// Runs a crawl over HTTP as described by the configuration
///
/// Validates `config`, builds the HTTP fetcher from it and starts [`crawl`]
/// with the default [`UrlAnalyzer`].
///
/// # Returns
///
/// * `Ok(CrawlHandle)` - The crawl is running
/// * `Err(CrawlError::Config)` - The configuration is invalid
/// * `Err(CrawlError::Reqwest)` - The HTTP client could not be built
pub fn run_crawl(config: &Config) -> Result<CrawlHandle, CrawlError> {
    validate(config)?;
    let fetcher = HttpFetcher::from_config(config)?;
    Ok(crawl(
        CrawlSettings::from(&config.crawler),
        Arc::new(fetcher),
        Arc::new(UrlAnalyzer),
    ))
}
