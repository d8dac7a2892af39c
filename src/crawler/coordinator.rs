//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that:
//! - Seeds the crawl by submitting the start URL for admission
//! - Spawns one crawl task per admitted URL
//! - Forwards every fetched page to the analysis stage
//! - Submits the links of pages below the depth limit as new candidates
//! - Stops when the completion tracker closes the to-crawl stream

use crate::crawler::dedup::DedupGate;
use crate::crawler::fetcher::{Fetcher, Page};
use crate::crawler::tracker::CompletionTracker;
use crate::crawler::CrawlSettings;
use crate::output::CrawlStatistics;
use crate::state::TaskState;
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A URL admitted for crawling, with its distance from the start URL
///
/// The start URL has depth 1; links found on a page at depth `d` are
/// submitted at depth `d + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u32,
}

/// State shared by every task of one crawl run
///
/// The visited set and the in-flight count live here rather than in globals,
/// so independent runs never see each other's state.
pub struct CrawlContext {
    gate: DedupGate,
    tracker: CompletionTracker,
    fetcher: Arc<dyn Fetcher>,
    pages: mpsc::Sender<Page>,
    stats: Arc<CrawlStatistics>,
    max_depth: u32,
}

impl CrawlContext {
    /// Offers a candidate URL for admission at `depth`
    ///
    /// Returns true if the URL was admitted and handed to the coordinator.
    /// Already-visited URLs are a silent no-op.
    pub fn submit(&self, url: String, depth: u32) -> bool {
        if !self.gate.admit(&url) {
            self.stats.record_duplicate();
            tracing::debug!("Already visited {}", url);
            return false;
        }

        self.stats.record_admitted();
        tracing::debug!("Admitted {} at depth {}", url, depth);
        self.tracker.dispatch(CrawlTask { url, depth })
    }

    /// Number of distinct URLs admitted so far
    pub fn admitted(&self) -> usize {
        self.gate.len()
    }

    /// Number of crawl tasks admitted but not yet finished
    #[cfg(test)]
    pub fn in_flight(&self) -> u64 {
        self.tracker.in_flight()
    }
}

/// Marks a crawl task finished when dropped, even if the task panicked
struct FinishGuard<'a> {
    tracker: &'a CompletionTracker,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if self.tracker.decrement() {
            tracing::info!("All crawl tasks finished");
        }
    }
}

/// Main crawler coordinator structure
///
/// Owns the receiving end of the to-crawl stream and spawns one task per
/// admitted URL.
pub struct Coordinator {
    context: Arc<CrawlContext>,
    to_crawl: mpsc::UnboundedReceiver<CrawlTask>,
    start_url: String,
}

impl Coordinator {
    /// Creates a new coordinator for one crawl run
    ///
    /// # Arguments
    ///
    /// * `settings` - Start URL and depth limit
    /// * `fetcher` - The fetch capability
    /// * `pages` - Sending half of the page stream read by the analysis stage
    /// * `stats` - Counters shared with the analysis stage
    pub fn new(
        settings: &CrawlSettings,
        fetcher: Arc<dyn Fetcher>,
        pages: mpsc::Sender<Page>,
        stats: Arc<CrawlStatistics>,
    ) -> Self {
        let (to_crawl_tx, to_crawl_rx) = mpsc::unbounded_channel();

        let context = CrawlContext {
            gate: DedupGate::new(),
            tracker: CompletionTracker::new(to_crawl_tx),
            fetcher,
            pages,
            stats,
            max_depth: settings.max_depth,
        };

        Self {
            context: Arc::new(context),
            to_crawl: to_crawl_rx,
            start_url: settings.start_url.clone(),
        }
    }

    /// Shared context of this run
    pub fn context(&self) -> &Arc<CrawlContext> {
        &self.context
    }

    /// Runs the crawl loop until every admitted URL has been handled
    ///
    /// Returns the number of crawl tasks spawned. The page stream closes once
    /// this returns and the last crawl task has released its sender.
    pub async fn run(mut self) -> u64 {
        tracing::info!(
            "Starting crawl at {} (max depth {})",
            self.start_url,
            self.context.max_depth
        );

        if !self.context.submit(self.start_url.clone(), 1) {
            tracing::error!("Start URL {} could not be admitted", self.start_url);
            return 0;
        }

        let mut spawned: u64 = 0;
        while let Some(task) = self.to_crawl.recv().await {
            spawned += 1;
            let context = Arc::clone(&self.context);
            tokio::spawn(crawl_task(context, task));
        }

        tracing::info!(
            "To-crawl stream closed after {} crawl tasks ({} distinct URLs admitted)",
            spawned,
            self.context.admitted()
        );
        spawned
    }
}

/// Executes one crawl task and reports its completion
async fn crawl_task(context: Arc<CrawlContext>, task: CrawlTask) {
    let _finish = FinishGuard {
        tracker: &context.tracker,
    };

    match process_task(&context, &task).await {
        Ok(state) => {
            debug_assert!(state.is_terminal());
            tracing::trace!("{} finished as {}", task.url, state);
        }
        Err(e) => tracing::error!("Crawl task for {} aborted: {}", task.url, e),
    }
}

/// Fetches the task's URL, forwards the page and submits its links
///
/// # Flow
///
/// 1. `Pending -> Fetching`, call the fetch capability
/// 2. On error: `Fetching -> Failed`, no page is emitted
/// 3. On success: `Fetching -> Succeeded`, send the page downstream (this
///    waits while the analysis stage is behind)
/// 4. At the depth limit: stop without looking at links
/// 5. Otherwise submit every link at `depth + 1`
async fn process_task(context: &CrawlContext, task: &CrawlTask) -> Result<TaskState, CrawlError> {
    let state = advance(TaskState::Pending, TaskState::Fetching, &task.url)?;
    tracing::debug!("Crawling URL: {} (depth {})", task.url, task.depth);

    let page = match context.fetcher.fetch(&task.url).await {
        Ok(page) => page,
        Err(e) => {
            context.stats.record_fetch_error();
            tracing::warn!("Error on {}: {}", task.url, e);
            return advance(state, TaskState::Failed, &task.url);
        }
    };

    context.stats.record_fetched(page.links.len());
    let state = advance(state, TaskState::Succeeded, &task.url)?;

    let expand = task.depth < context.max_depth;
    let children = if expand {
        page.links.clone()
    } else {
        Vec::new()
    };

    if context.pages.send(page).await.is_err() {
        tracing::debug!("Analysis stage gone; page {} not analyzed", task.url);
    }

    if !expand {
        context.stats.record_depth_limited();
        tracing::debug!(
            "Reached max depth {} at {}",
            context.max_depth,
            task.url
        );
        return Ok(state);
    }

    for link in children {
        context.submit(link, task.depth + 1);
    }

    Ok(state)
}

fn advance(from: TaskState, to: TaskState, url: &str) -> Result<TaskState, CrawlError> {
    let next = from.transition(to)?;
    tracing::trace!("{}: {} -> {}", url, from, next);
    Ok(next)
}
