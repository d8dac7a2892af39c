//! Completion tracker for a crawl of unknown size
//!
//! The number of URLs a crawl will visit is only known once it is over, so
//! completion cannot be a counter sized up front. Instead every admitted URL
//! raises a live in-flight count and every finished crawl task lowers it; the
//! transition to zero is the signal that no more URLs will ever be produced.
//!
//! The tracker also owns the only sender of the to-crawl stream. Admitting a
//! task (increment, then hand-off) and closing the stream (drop the sender)
//! both happen under the tracker's lock, so:
//! - a child's increment is always visible before its own decrement
//! - the count cannot read zero while a child is being handed off
//! - the stream is closed exactly once, when the true net count is zero

use crate::crawler::coordinator::CrawlTask;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

struct TrackerState {
    in_flight: u64,
    to_crawl: Option<mpsc::UnboundedSender<CrawlTask>>,
}

/// Counts in-flight crawl tasks and closes the to-crawl stream at zero
pub struct CompletionTracker {
    state: Mutex<TrackerState>,
}

impl CompletionTracker {
    /// Creates a tracker at zero that owns the sending half of the to-crawl stream
    pub fn new(to_crawl: mpsc::UnboundedSender<CrawlTask>) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                in_flight: 0,
                to_crawl: Some(to_crawl),
            }),
        }
    }

    /// Records one more in-flight task without handing anything off
    ///
    /// Has no effect once the stream is closed: a finished crawl cannot be
    /// restarted.
    pub fn increment(&self) {
        let mut state = self.lock();
        if state.to_crawl.is_some() {
            state.in_flight += 1;
        }
    }

    /// Records an admitted task and hands it to the coordinator
    ///
    /// Returns false if the stream is already closed or the coordinator is
    /// gone; the count is left untouched in that case.
    pub fn dispatch(&self, task: CrawlTask) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(sender) = state.to_crawl.as_ref() else {
            tracing::warn!("Dropping {}: crawl already finished", task.url);
            return false;
        };

        state.in_flight += 1;
        if sender.send(task).is_err() {
            state.in_flight -= 1;
            tracing::warn!("Coordinator stopped receiving; task dropped");
            return false;
        }
        true
    }

    /// Records one finished task
    ///
    /// Returns true only for the call that brought the count to zero and
    /// closed the to-crawl stream. A decrement with nothing in flight is
    /// ignored so the count never goes negative.
    pub fn decrement(&self) -> bool {
        let mut state = self.lock();
        if state.in_flight == 0 {
            tracing::error!("Completion tracker decremented with nothing in flight");
            return false;
        }

        state.in_flight -= 1;
        if state.in_flight > 0 {
            return false;
        }

        match state.to_crawl.take() {
            Some(sender) => {
                drop(sender);
                tracing::debug!("No crawl tasks left in flight; closing to-crawl stream");
                true
            }
            None => false,
        }
    }

    /// Current number of in-flight tasks
    pub fn in_flight(&self) -> u64 {
        self.lock().in_flight
    }

    /// Returns true once the to-crawl stream has been closed
    pub fn is_closed(&self) -> bool {
        self.lock().to_crawl.is_none()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
