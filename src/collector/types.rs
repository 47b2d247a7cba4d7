//! Collector types
//!
//! Configuration, run plan, and the outcome of a collection run.

use crate::error::{Error, Result};
use crate::types::{PageIndex, ResultSet, StatusFilter};
use std::ops::RangeInclusive;

/// What to do when a page fetch fails after probing succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and keep going; the run returns a partial result
    #[default]
    Isolate,
    /// Stop every worker and fail the whole run
    FailFast,
}

/// Configuration for a collection run
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// Items per page for worker fetches
    pub page_size: u32,
    /// Items per page for the probe request
    pub probe_page_size: u32,
    /// Which items contribute to the result
    pub filter: StatusFilter,
    /// Page failure handling
    pub failure_policy: FailurePolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            page_size: 100,
            probe_page_size: 1,
            filter: StatusFilter::default(),
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

impl CollectorConfig {
    /// Create a new collector config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set worker count
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set probe page size
    #[must_use]
    pub fn with_probe_page_size(mut self, probe_page_size: u32) -> Self {
        self.probe_page_size = probe_page_size;
        self
    }

    /// Set item filter
    #[must_use]
    pub fn with_filter(mut self, filter: StatusFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set failure policy
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Reject configurations that cannot run
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_value("workers", "must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        if self.probe_page_size == 0 {
            return Err(Error::invalid_value("probe_page_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// Number of pages of `page_size` needed to hold `total_items`
pub fn page_count(total_items: u64, page_size: u32) -> u64 {
    total_items.div_ceil(u64::from(page_size.max(1)))
}

/// Outcome of the probe: how much work the run has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Collection-wide item count reported by the probe
    pub total_items: u64,
    /// Page size the workers fetch with
    pub page_size: u32,
    /// Number of pages to fetch
    pub pages: u32,
}

impl Plan {
    /// Plan the fetch of `total_items` in pages of `page_size`
    pub fn new(total_items: u64, page_size: u32) -> Result<Self> {
        let pages = u32::try_from(page_count(total_items, page_size)).map_err(|_| {
            Error::decode(format!(
                "totalItems {total_items} needs more than {} pages",
                u32::MAX
            ))
        })?;

        Ok(Self {
            total_items,
            page_size,
            pages,
        })
    }

    /// Check if there is nothing to fetch
    pub fn is_empty(&self) -> bool {
        self.pages == 0
    }

    /// Every page index the run dispatches
    pub fn page_indices(&self) -> RangeInclusive<PageIndex> {
        1..=self.pages
    }
}

/// A page that could not be fetched
#[derive(Debug)]
pub struct PageFailure {
    /// Failed page index
    pub page: PageIndex,
    /// Why it failed
    pub error: Error,
}

/// Statistics from a collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Pages merged into the result
    pub pages_fetched: usize,
    /// Pages that failed
    pub pages_failed: usize,
    /// Items seen across merged pages
    pub items_seen: usize,
    /// Items that passed the filter
    pub items_matched: usize,
    /// Matching ids already present in the result
    pub duplicates: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl CollectStats {
    /// Record one merged page
    pub(crate) fn add_page(&mut self, summary: PageSummary) {
        self.pages_fetched += 1;
        self.items_seen += summary.items;
        self.items_matched += summary.matched;
        self.duplicates += summary.matched - summary.added;
    }

    /// Record one failed page
    pub(crate) fn add_failure(&mut self) {
        self.pages_failed += 1;
    }

    /// Set duration
    pub(crate) fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Per-page counts reported by a worker
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PageSummary {
    pub items: usize,
    pub matched: usize,
    pub added: usize,
}

/// One completion signal from a worker
#[derive(Debug)]
pub(crate) struct PageReport {
    pub page: PageIndex,
    pub worker: usize,
    pub outcome: Result<PageSummary>,
}

/// Result of a collection run
#[derive(Debug)]
pub struct Collection {
    /// What the probe found
    pub plan: Plan,
    /// Ids of every matching item on the merged pages
    pub results: ResultSet,
    /// Pages that failed, sorted by index
    pub failures: Vec<PageFailure>,
    /// Run statistics
    pub stats: CollectStats,
}

impl Collection {
    /// Check if every planned page was merged
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Indices of failed pages
    pub fn failed_pages(&self) -> Vec<PageIndex> {
        self.failures.iter().map(|f| f.page).collect()
    }
}
