//! Pool worker
//!
//! A worker pulls page indices from the shared queue until it is closed and
//! drained, fetches each page, merges matching ids into the shared result
//! set, and sends exactly one report per page it pulled.

use super::types::{PageReport, PageSummary};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::types::{Page, PageIndex, ResultSet, StatusFilter};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Receiving end of the page queue, shared by all workers
pub(crate) type SharedQueue = Arc<Mutex<mpsc::Receiver<PageIndex>>>;

pub(crate) struct Worker {
    pub id: usize,
    pub fetcher: Arc<dyn PageFetcher>,
    pub page_size: u32,
    pub filter: StatusFilter,
    pub queue: SharedQueue,
    pub results: Arc<Mutex<ResultSet>>,
    pub reports: mpsc::UnboundedSender<PageReport>,
    pub cancel: CancellationToken,
}

impl Worker {
    pub async fn run(self) {
        let mut handled = 0usize;

        loop {
            let page = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                page = next_page(&self.queue) => match page {
                    Some(page) => page,
                    None => break,
                },
            };

            trace!(worker = self.id, page, "Pulled page");

            let outcome = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                fetched = self.fetcher.fetch(page, self.page_size) => self.merge(fetched).await,
            };

            handled += 1;
            let report = PageReport {
                page,
                worker: self.id,
                outcome,
            };
            if self.reports.send(report).is_err() {
                // collector is gone
                break;
            }
        }

        debug!(worker = self.id, pages = handled, "Worker exiting");
    }

    async fn merge(&self, fetched: Result<Page>) -> Result<PageSummary> {
        let page = fetched?;
        let ids: Vec<&str> = self.filter.select(&page).collect();
        let matched = ids.len();

        let added = self.results.lock().await.extend(ids);

        Ok(PageSummary {
            items: page.items.len(),
            matched,
            added,
        })
    }
}

async fn next_page(queue: &SharedQueue) -> Option<PageIndex> {
    queue.lock().await.recv().await
}
