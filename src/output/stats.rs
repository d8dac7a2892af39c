//! Live crawl statistics
//!
//! Counters are shared by the crawl and analysis stages and updated as work
//! happens; a [`StatisticsSnapshot`] is a plain copy for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated concurrently by crawl and analysis tasks
#[derive(Debug, Default)]
pub struct CrawlStatistics {
    admitted: AtomicU64,
    duplicates: AtomicU64,
    fetched: AtomicU64,
    fetch_errors: AtomicU64,
    depth_limited: AtomicU64,
    links_found: AtomicU64,
    analyzed: AtomicU64,
    analysis_errors: AtomicU64,
}

/// Point-in-time copy of [`CrawlStatistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    /// URLs admitted by the dedup gate
    pub admitted: u64,

    /// Candidate URLs rejected as already visited
    pub duplicates: u64,

    /// Successful fetches
    pub fetched: u64,

    /// Failed fetches
    pub fetch_errors: u64,

    /// Fetched pages whose links were not expanded because of the depth limit
    pub depth_limited: u64,

    /// Outbound links seen on fetched pages, duplicates included
    pub links_found: u64,

    /// Pages turned into results
    pub analyzed: u64,

    /// Pages whose analysis failed
    pub analysis_errors: u64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetched(&self, links: usize) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
        self.links_found.fetch_add(links as u64, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_depth_limited(&self) {
        self.depth_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analyzed(&self) {
        self.analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_analysis_error(&self) {
        self.analysis_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            depth_limited: self.depth_limited.load(Ordering::Relaxed),
            links_found: self.links_found.load(Ordering::Relaxed),
            analyzed: self.analyzed.load(Ordering::Relaxed),
            analysis_errors: self.analysis_errors.load(Ordering::Relaxed),
        }
    }
}

impl StatisticsSnapshot {
    /// Fraction of admitted URLs that were fetched successfully, in percent
    pub fn success_rate(&self) -> f64 {
        if self.admitted == 0 {
            0.0
        } else {
            (self.fetched as f64 / self.admitted as f64) * 100.0
        }
    }
}

/// Logs the statistics summary
pub fn print_statistics(stats: &StatisticsSnapshot) {
    tracing::info!(
        "Crawl finished: {} admitted, {} duplicates skipped, {} links seen",
        stats.admitted,
        stats.duplicates,
        stats.links_found
    );
    tracing::info!(
        "Fetched {} pages ({} failed, {} at depth limit), success rate {:.1}%",
        stats.fetched,
        stats.fetch_errors,
        stats.depth_limited,
        stats.success_rate()
    );
    tracing::info!(
        "Analyzed {} pages ({} analysis errors)",
        stats.analyzed,
        stats.analysis_errors
    );
}
