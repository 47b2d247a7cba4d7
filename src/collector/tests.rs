//! Tests for the paginated collector

use super::*;
use crate::error::Error;
use crate::fetcher::PageFetcher;
use crate::types::{Item, Page, PageIndex, StatusFilter, FINISHED_STATUS};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

/// Deterministic in-memory collection of `total` items
///
/// Item `n` has id `item-n`. The first `sentinels_per_page` items of every
/// fetched page carry the finished status.
struct MockFetcher {
    total: u64,
    sentinels_per_page: usize,
    fail_pages: HashSet<PageIndex>,
    fail_probe: bool,
    panic_page: Option<PageIndex>,
    delay: Option<Duration>,
    calls: StdMutex<Vec<(PageIndex, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    fn new(total: u64) -> Self {
        Self {
            total,
            sentinels_per_page: 0,
            fail_pages: HashSet::new(),
            fail_probe: false,
            panic_page: None,
            delay: None,
            calls: StdMutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn sentinels_per_page(mut self, n: usize) -> Self {
        self.sentinels_per_page = n;
        self
    }

    fn failing(mut self, page: PageIndex) -> Self {
        self.fail_pages.insert(page);
        self
    }

    fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    fn panicking(mut self, page: PageIndex) -> Self {
        self.panic_page = Some(page);
        self
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> Vec<(PageIndex, u32)> {
        self.calls.lock().unwrap().clone()
    }

    /// Worker fetches, i.e. every call after the probe
    fn worker_pages(&self) -> Vec<PageIndex> {
        let mut pages: Vec<PageIndex> = self.calls().iter().skip(1).map(|(p, _)| *p).collect();
        pages.sort_unstable();
        pages
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, page: PageIndex, page_size: u32) -> crate::Result<Page> {
        let is_probe = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((page, page_size));
            calls.len() == 1
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            // Vary latency per page so completions interleave.
            let jitter = u64::from(page % 4);
            tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if is_probe && self.fail_probe {
            return Err(Error::http_status(500, "probe down"));
        }
        if !is_probe && self.panic_page == Some(page) {
            panic!("fetcher blew up on page {page}");
        }
        if !is_probe && self.fail_pages.contains(&page) {
            return Err(Error::http_status(502, "bad gateway"));
        }

        let start = u64::from(page - 1) * u64::from(page_size);
        let end = (start + u64::from(page_size)).min(self.total);
        let items = (start..end)
            .enumerate()
            .map(|(i, n)| {
                let status = if i < self.sentinels_per_page {
                    FINISHED_STATUS
                } else {
                    (n % 4) as i64
                };
                Item::new(format!("item-{n}"), status)
            })
            .collect();

        Ok(Page::new(self.total, items))
    }
}

async fn run(fetcher: Arc<MockFetcher>, config: CollectorConfig) -> crate::Result<Collection> {
    PaginatedCollector::new(fetcher, config).collect().await
}

fn id_set(collection: &Collection) -> BTreeSet<String> {
    collection.results.iter().map(str::to_string).collect()
}

#[tokio::test]
async fn test_zero_items_only_probes() {
    let fetcher = Arc::new(MockFetcher::new(0));
    let collection = run(Arc::clone(&fetcher), CollectorConfig::default())
        .await
        .unwrap();

    assert_eq!(collection.plan.pages, 0);
    assert!(collection.results.is_empty());
    assert!(collection.is_complete());
    assert_eq!(fetcher.calls(), vec![(1, 1)]);
}

#[tokio::test]
async fn test_probe_page_size_differs_from_target() {
    let fetcher = Arc::new(MockFetcher::new(250));
    let config = CollectorConfig::new()
        .with_probe_page_size(1)
        .with_page_size(100);

    let collection = run(Arc::clone(&fetcher), config).await.unwrap();

    assert_eq!(collection.plan.total_items, 250);
    assert_eq!(collection.plan.pages, 3);
    assert_eq!(fetcher.calls()[0], (1, 1));
    assert!(fetcher.calls().iter().skip(1).all(|(_, size)| *size == 100));
    assert_eq!(fetcher.worker_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_sentinel_items_are_excluded() {
    // 100 + 100 + 50 items, first 10 of each page finished
    let fetcher = Arc::new(MockFetcher::new(250).sentinels_per_page(10));
    let collection = run(Arc::clone(&fetcher), CollectorConfig::default())
        .await
        .unwrap();

    assert_eq!(collection.results.len(), 220);
    assert_eq!(collection.stats.pages_fetched, 3);
    assert_eq!(collection.stats.items_seen, 250);
    assert_eq!(collection.stats.items_matched, 220);
    assert_eq!(collection.stats.duplicates, 0);

    // first ten of page 2 are items 100..110
    assert!(!collection.results.contains("item-100"));
    assert!(collection.results.contains("item-110"));
}

#[tokio::test]
async fn test_custom_excluded_status() {
    let fetcher = Arc::new(MockFetcher::new(40));
    let config = CollectorConfig::new()
        .with_page_size(10)
        .with_filter(StatusFilter::excluding(0));

    let collection = run(fetcher, config).await.unwrap();

    // statuses cycle n % 4, so a quarter are excluded
    assert_eq!(collection.results.len(), 30);
    assert!(!collection.results.contains("item-0"));
    assert!(collection.results.contains("item-1"));
}

#[tokio::test]
async fn test_every_page_fetched_exactly_once() {
    for workers in [1, 3, 5, 16] {
        let fetcher = Arc::new(MockFetcher::new(1_234).delay(Duration::from_millis(1)));
        let config = CollectorConfig::new().with_workers(workers).with_page_size(25);

        let collection = run(Arc::clone(&fetcher), config).await.unwrap();

        let expected: Vec<PageIndex> = (1..=50).collect();
        assert_eq!(fetcher.worker_pages(), expected, "workers = {workers}");
        assert_eq!(collection.stats.pages_fetched, 50);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_result_identical_across_worker_counts() {
    let mut seen: Option<BTreeSet<String>> = None;

    for workers in [1, 5, 50] {
        for _ in 0..3 {
            let fetcher = Arc::new(
                MockFetcher::new(997)
                    .sentinels_per_page(3)
                    .delay(Duration::from_millis(1)),
            );
            let config = CollectorConfig::new().with_workers(workers).with_page_size(20);
            let ids = id_set(&run(fetcher, config).await.unwrap());

            match &seen {
                Some(previous) => assert_eq!(&ids, previous, "workers = {workers}"),
                None => seen = Some(ids),
            }
        }
    }

    // 50 pages, 3 finished each, 997 items total
    assert_eq!(seen.unwrap().len(), 997 - 50 * 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bounded_by_workers() {
    let fetcher = Arc::new(MockFetcher::new(400).delay(Duration::from_millis(5)));
    let config = CollectorConfig::new().with_workers(4).with_page_size(10);

    run(Arc::clone(&fetcher), config).await.unwrap();

    let max = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 4, "max in flight was {max}");
    assert!(max > 1, "fetches never overlapped");
}

#[tokio::test]
async fn test_more_workers_than_pages() {
    let fetcher = Arc::new(MockFetcher::new(15));
    let config = CollectorConfig::new().with_workers(50).with_page_size(10);

    let collection = run(Arc::clone(&fetcher), config).await.unwrap();

    assert_eq!(collection.plan.pages, 2);
    assert_eq!(collection.results.len(), 15);
    assert_eq!(fetcher.worker_pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_duplicate_ids_counted_once() {
    struct Repeating;

    #[async_trait]
    impl PageFetcher for Repeating {
        async fn fetch(&self, _page: PageIndex, _page_size: u32) -> crate::Result<Page> {
            Ok(Page::new(
                6,
                vec![Item::new("same", 1), Item::new("also-same", 2)],
            ))
        }
    }

    let collector = PaginatedCollector::new(
        Arc::new(Repeating),
        CollectorConfig::new().with_page_size(2),
    );
    let collection = collector.collect().await.unwrap();

    assert_eq!(collection.plan.pages, 3);
    assert_eq!(collection.results.len(), 2);
    assert_eq!(collection.stats.items_matched, 6);
    assert_eq!(collection.stats.duplicates, 4);
}

#[tokio::test]
async fn test_isolated_page_failure_returns_partial_result() {
    let fetcher = Arc::new(MockFetcher::new(300).failing(2));
    let collection = run(Arc::clone(&fetcher), CollectorConfig::default())
        .await
        .unwrap();

    assert!(!collection.is_complete());
    assert_eq!(collection.failed_pages(), vec![2]);
    assert!(collection.failures[0].error.is_protocol());
    assert_eq!(collection.stats.pages_fetched, 2);
    assert_eq!(collection.stats.pages_failed, 1);

    // pages 1 and 3 merged, page 2 missing
    assert!(collection.results.contains("item-0"));
    assert!(collection.results.contains("item-250"));
    assert!(!collection.results.contains("item-150"));
    assert_eq!(fetcher.worker_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let fetcher = Arc::new(MockFetcher::new(300).failing(2));
    let config = CollectorConfig::new().with_failure_policy(FailurePolicy::FailFast);

    let err = run(fetcher, config).await.unwrap_err();

    match err {
        Error::PageFetch { page, source } => {
            assert_eq!(page, 2);
            assert!(matches!(*source, Error::HttpStatus { status: 502, .. }));
        }
        other => panic!("Expected PageFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dead_pool_fails_instead_of_hanging() {
    for workers in [1, 3] {
        let fetcher = Arc::new(MockFetcher::new(300).panicking(2));
        let config = CollectorConfig::new().with_workers(workers);

        let outcome = tokio::time::timeout(Duration::from_secs(5), run(fetcher, config))
            .await
            .expect("collector hung after a worker died");

        assert!(
            matches!(outcome, Err(Error::WorkerPool { .. })),
            "workers = {workers}: {outcome:?}"
        );
    }
}

#[tokio::test]
async fn test_probe_failure_is_fatal() {
    let fetcher = Arc::new(MockFetcher::new(300).failing_probe());
    let err = run(Arc::clone(&fetcher), CollectorConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PageFetch { page: 1, .. }));
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_invalid_config_fails_before_fetching() {
    let fetcher = Arc::new(MockFetcher::new(10));
    let err = run(Arc::clone(&fetcher), CollectorConfig::new().with_workers(0))
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_run() {
    let fetcher = Arc::new(MockFetcher::new(10_000).delay(Duration::from_millis(50)));
    let collector = PaginatedCollector::new(
        Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
        CollectorConfig::new().with_workers(2).with_page_size(10),
    );
    let token = collector.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = collector.collect().await.unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
    // 1000 pages planned, only a handful attempted
    assert!(fetcher.calls().len() < 20);
}

#[tokio::test]
async fn test_cancelled_before_probe() {
    let fetcher = Arc::new(MockFetcher::new(10));
    let token = CancellationToken::new();
    token.cancel();

    let collector = PaginatedCollector::new(
        Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
        CollectorConfig::default(),
    )
    .with_cancellation(token);

    assert!(matches!(collector.collect().await, Err(Error::Cancelled)));
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_probe_returns_plan() {
    let fetcher = Arc::new(MockFetcher::new(101));
    let collector = PaginatedCollector::new(
        Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
        CollectorConfig::new().with_page_size(50),
    );

    let plan = collector.probe().await.unwrap();
    assert_eq!(
        plan,
        Plan {
            total_items: 101,
            page_size: 50,
            pages: 3
        }
    );
    assert_eq!(fetcher.calls(), vec![(1, 1)]);
}
