//! Types for the refresh scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source that could not be fetched during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleReport {
    /// Sequence number of the cycle, starting at 1.
    pub cycle: u64,
    /// Sources fetched and merged.
    pub sources_ok: usize,
    /// Sources skipped because their manifest could not be fetched.
    pub failed_sources: Vec<SourceFailure>,
    /// Entries in the catalog built by this cycle.
    pub entries: usize,
    /// Artifacts freshly downloaded.
    pub downloaded: usize,
    /// Artifacts reused from the cache.
    pub cache_hits: usize,
    /// Artifacts that could not be cached.
    pub artifact_failures: usize,
    /// Whether the cycle replaced the published catalog.
    pub published: bool,
    pub duration_ms: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CycleReport {
    pub(crate) fn new(cycle: u64) -> Self {
        Self {
            cycle,
            ..Default::default()
        }
    }

    /// Metric label for the cycle result.
    pub fn result_label(&self) -> &'static str {
        if !self.published {
            "failed"
        } else if self.failed_sources.is_empty() && self.artifact_failures == 0 {
            "published"
        } else {
            "partial"
        }
    }
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the timer loop is running.
    pub running: bool,
    /// Cycles started since startup.
    pub cycles: u64,
    pub last_report: Option<CycleReport>,
}
