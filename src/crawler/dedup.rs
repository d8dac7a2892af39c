//! Dedup gate: the single authority on whether a URL has been admitted

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Admits each distinct URL string exactly once per crawl run
///
/// The visited set only grows. Checking for and recording a URL happen under
/// one lock, so two concurrent callers offering the same URL can never both
/// be admitted.
#[derive(Debug, Default)]
pub struct DedupGate {
    visited: Mutex<HashSet<String>>,
}

impl DedupGate {
    /// Creates an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this call is the first admission of `url`
    ///
    /// Later calls for the same string return false and change nothing.
    pub fn admit(&self, url: &str) -> bool {
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    /// Returns true if `url` has already been admitted
    #[cfg(test)]
    pub fn contains(&self, url: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    /// Number of distinct URLs admitted so far
    pub(crate) fn len(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been admitted yet
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
