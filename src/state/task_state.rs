/// Crawl task state definitions
///
/// This module defines the states a crawl task moves through between
/// admission and completion.
use crate::CrawlError;
use std::fmt;

/// Represents the current state of a single crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// URL has been admitted but the task has not started fetching
    Pending,

    /// The fetch capability is being called
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and forwarded to analysis
    Succeeded,

    /// Fetch failed; the branch is abandoned without retry
    Failed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if `self -> to` is a legal move
    pub fn can_transition_to(&self, to: TaskState) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Succeeded)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Moves to `to`, rejecting illegal transitions
    pub fn transition(self, to: TaskState) -> Result<TaskState, CrawlError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CrawlError::InvalidTransition { from: self, to })
        }
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
