//! Analysis stage
//!
//! Every page the crawl produces is handed to its own task, which applies an
//! [`Analyzer`] and emits a [`CrawlResult`]. The stage closes the result
//! stream only after the page stream has closed and every analysis task it
//! spawned has finished.

use crate::crawler::fetcher::Page;
use crate::output::CrawlStatistics;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

/// Result record produced for each analyzed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// URL of the analyzed page
    pub url: String,

    /// Number of outbound links found on the page, duplicates included
    pub links_found: usize,
}

/// An analyzer could not turn a page into a result
#[derive(Debug, Error)]
#[error("Analysis of {url} failed: {message}")]
pub struct AnalysisError {
    pub url: String,
    pub message: String,
}

/// Turns a fetched page into a result record
///
/// Expected to be pure and quick; it runs directly on the async runtime.
pub trait Analyzer: Send + Sync {
    fn parse(&self, page: &Page) -> Result<CrawlResult, AnalysisError>;
}

/// Default analyzer: records the page URL and its link count
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlAnalyzer;

impl Analyzer for UrlAnalyzer {
    fn parse(&self, page: &Page) -> Result<CrawlResult, AnalysisError> {
        Ok(CrawlResult {
            url: page.url.clone(),
            links_found: page.links.len(),
        })
    }
}

/// Fans pages out to analysis tasks and fans their results back in
pub struct AnalysisStage {
    analyzer: Arc<dyn Analyzer>,
    stats: Arc<CrawlStatistics>,
}

impl AnalysisStage {
    pub fn new(analyzer: Arc<dyn Analyzer>, stats: Arc<CrawlStatistics>) -> Self {
        Self { analyzer, stats }
    }

    /// Runs until `pages` closes and every spawned analysis has finished
    ///
    /// `results` is dropped on return; once the last task's clone is gone the
    /// receiver observes end-of-stream.
    pub async fn run(self, mut pages: mpsc::Receiver<Page>, results: mpsc::Sender<CrawlResult>) {
        let mut tasks = JoinSet::new();
        let mut spawned: u64 = 0;

        loop {
            tokio::select! {
                page = pages.recv() => match page {
                    Some(page) => {
                        spawned += 1;
                        self.spawn_analysis(&mut tasks, page, results.clone());
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.reap(joined);
                }
            }
        }

        tracing::debug!(
            "Page stream closed; waiting for {} analysis tasks",
            tasks.len()
        );
        while let Some(joined) = tasks.join_next().await {
            self.reap(joined);
        }

        drop(results);
        tracing::info!("Analysis stage finished after {} pages", spawned);
    }

    fn spawn_analysis(
        &self,
        tasks: &mut JoinSet<()>,
        page: Page,
        results: mpsc::Sender<CrawlResult>,
    ) {
        let analyzer = Arc::clone(&self.analyzer);
        let stats = Arc::clone(&self.stats);

        tasks.spawn(async move {
            tracing::debug!("Analysing response from: {}", page.url);

            match analyzer.parse(&page) {
                Ok(result) => {
                    stats.record_analyzed();
                    if results.send(result).await.is_err() {
                        tracing::debug!("Result receiver dropped; discarding {}", page.url);
                    }
                }
                Err(e) => {
                    stats.record_analysis_error();
                    tracing::warn!("{}", e);
                }
            }
        });
    }

    fn reap(&self, joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            self.stats.record_analysis_error();
            tracing::error!("Analysis task did not complete: {}", e);
        }
    }
}
