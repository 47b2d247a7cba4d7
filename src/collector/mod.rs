//! Paginated collector
//!
//! Probes the first page to learn the collection size, plans the page
//! count, then drives a fixed pool of workers over a shared queue of page
//! indices and merges the matching ids into one [`ResultSet`].
//!
//! ```text
//!            probe(1) ──► Plan { pages }
//!                              │
//!   collector ──push 1..=pages──► [bounded queue] ──► worker × W ──► fetch
//!       ▲                                                  │
//!       └────────────── one PageReport per page ◄──────────┤
//!                                                          ▼
//!                                           Mutex<ResultSet> (shared)
//! ```
//!
//! The collector is the only producer and the only one that closes the
//! queue. It registers each page as outstanding before pushing it and
//! returns once every registered page has reported back.

mod types;
mod worker;

pub use types::{
    page_count, CollectStats, Collection, CollectorConfig, FailurePolicy, PageFailure, Plan,
};

use crate::error::{Error, Result};
use crate::fetcher::PageFetcher;
use crate::types::{PageIndex, ResultSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::PageReport;
use worker::Worker;

/// Fetches every page of a remote collection concurrently
pub struct PaginatedCollector {
    fetcher: Arc<dyn PageFetcher>,
    config: CollectorConfig,
    cancel: CancellationToken,
}

impl PaginatedCollector {
    /// Create a collector over the given fetcher
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: CollectorConfig) -> Self {
        Self {
            fetcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this collector's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the collector configuration
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Fetch page 1 and plan the run
    pub async fn probe(&self) -> Result<Plan> {
        self.config.validate()?;

        let page = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            page = self.fetcher.fetch(1, self.config.probe_page_size) => {
                page.map_err(|e| Error::page(1, e))?
            }
        };

        let plan = Plan::new(page.total_items, self.config.page_size)?;
        info!(
            "Probe: {} items, {} pages of {}",
            plan.total_items, plan.pages, plan.page_size
        );
        Ok(plan)
    }

    /// Run the whole collection: probe, plan, fetch every page, merge
    pub async fn collect(&self) -> Result<Collection> {
        let start = Instant::now();
        let plan = self.probe().await?;

        let mut collection = if plan.is_empty() {
            Collection {
                plan,
                results: ResultSet::new(),
                failures: Vec::new(),
                stats: CollectStats::default(),
            }
        } else {
            self.dispatch(plan).await?
        };

        collection.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Collected {} ids from {}/{} pages in {}ms",
            collection.results.len(),
            collection.stats.pages_fetched,
            plan.pages,
            collection.stats.duration_ms
        );
        Ok(collection)
    }

    async fn dispatch(&self, plan: Plan) -> Result<Collection> {
        let workers = self.config.workers.min(plan.pages as usize);
        let pool_cancel = self.cancel.child_token();
        let results = Arc::new(Mutex::new(ResultSet::new()));

        let (queue_tx, queue_rx) = mpsc::channel::<PageIndex>(workers);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<PageReport>();

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    fetcher: Arc::clone(&self.fetcher),
                    page_size: plan.page_size,
                    filter: self.config.filter,
                    queue: Arc::clone(&queue_rx),
                    results: Arc::clone(&results),
                    reports: report_tx.clone(),
                    cancel: pool_cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(queue_rx);
        drop(report_tx);
        debug!("Started {} workers", workers);

        let mut queue = Some(queue_tx);
        let mut pending = plan.page_indices().peekable();
        let mut outstanding = 0usize;
        let mut failures = Vec::new();
        let mut stats = CollectStats::default();

        let abort = loop {
            if queue.is_none() && outstanding == 0 {
                break None;
            }

            tokio::select! {
                biased;
                () = pool_cancel.cancelled() => break Some(Error::Cancelled),

                report = report_rx.recv(), if outstanding > 0 => {
                    let Some(report) = report else {
                        break Some(Error::worker_pool(format!(
                            "all workers exited with {outstanding} pages outstanding"
                        )));
                    };
                    outstanding -= 1;

                    match report.outcome {
                        Ok(summary) => {
                            debug!(
                                page = report.page,
                                worker = report.worker,
                                matched = summary.matched,
                                "Merged page"
                            );
                            stats.add_page(summary);
                        }
                        Err(error) => match self.config.failure_policy {
                            FailurePolicy::FailFast => {
                                break Some(Error::page(report.page, error));
                            }
                            FailurePolicy::Isolate => {
                                warn!("Page {} failed: {}", report.page, error);
                                stats.add_failure();
                                failures.push(PageFailure {
                                    page: report.page,
                                    error,
                                });
                            }
                        },
                    }
                }

                permit = reserve(queue.as_ref()), if queue.is_some() => {
                    let Some(permit) = permit else {
                        let next = pending.peek().copied().unwrap_or(plan.pages);
                        break Some(Error::worker_pool(format!(
                            "work queue closed with page {next} of {} not enqueued",
                            plan.pages
                        )));
                    };

                    if let Some(page) = pending.next() {
                        outstanding += 1;
                        permit.send(page);
                    }
                    if pending.peek().is_none() {
                        queue = None;
                        debug!("Enqueued all {} pages, queue closed", plan.pages);
                    }
                }
            }
        };

        if let Some(error) = abort {
            pool_cancel.cancel();
            drop(queue);
            shutdown(handles).await;
            return Err(error);
        }

        shutdown(handles).await;

        let results = match Arc::try_unwrap(results) {
            Ok(results) => results.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        };
        failures.sort_by_key(|f: &PageFailure| f.page);

        Ok(Collection {
            plan,
            results,
            failures,
            stats,
        })
    }
}

impl std::fmt::Debug for PaginatedCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedCollector")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Wait for a free queue slot; `None` once every worker dropped the queue
async fn reserve(
    queue: Option<&mpsc::Sender<PageIndex>>,
) -> Option<mpsc::OwnedPermit<PageIndex>> {
    match queue {
        Some(tx) => tx.clone().reserve_owned().await.ok(),
        None => std::future::pending().await,
    }
}

async fn shutdown(handles: Vec<JoinHandle<()>>) {
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            warn!("Worker task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests;
