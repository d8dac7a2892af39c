//! State module for tracking crawl task progress
//!
//! Every admitted URL is handled by exactly one crawl task, and that task
//! walks the [`TaskState`] machine once: `Pending -> Fetching -> Succeeded | Failed`.

mod task_state;

pub use task_state::TaskState;
