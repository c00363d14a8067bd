//! Enrichment scheduler types and events.

use std::time::Duration;

/// Tuning for the enrichment worker pool.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Maximum detail fetches in flight at once.
    pub workers: usize,
    /// Wait after navigation before querying a detail page.
    pub settle_delay: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            workers: 6,
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Events emitted while the pool runs.
#[derive(Debug, Clone)]
pub enum EnrichEvent {
    /// A worker picked up a record's detail page
    Started { worker_id: usize, url: String },
    /// A record's shipping field was finalized
    Completed { index: usize, fallback: bool },
}

/// Outcome counters for one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Records whose shipping text came from the detail page.
    pub enriched: usize,
    /// Records that received the fallback sentinel.
    pub fallback: usize,
}
