//! Output module for crawl results and run statistics
//!
//! This module handles:
//! - Writing result records as plain text or JSON lines
//! - Live counters for the crawl and analysis stages
//! - Logging a statistics summary when a run ends

mod sink;
pub mod stats;

pub use sink::{ResultFormat, ResultWriter};
pub use stats::{print_statistics, CrawlStatistics, StatisticsSnapshot};
