use async_trait::async_trait;
use dnsward_infrastructure::dns::BlocklistRefresh;
use dnsward_jobs::BlocklistRefreshJob;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

struct CountingRefresher {
    calls: AtomicUsize,
}

impl CountingRefresher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlocklistRefresh for CountingRefresher {
    async fn refresh(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn job_starts_without_firing_immediately() {
    let refresher = Arc::new(CountingRefresher::new());
    let job = Arc::new(BlocklistRefreshJob::new(refresher.clone()).with_interval(60));

    job.start().await;
    sleep(Duration::from_millis(20)).await;

    assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn job_fires_on_each_tick_of_a_short_interval() {
    let refresher = Arc::new(CountingRefresher::new());
    let job = Arc::new(BlocklistRefreshJob::new(refresher.clone()).with_interval(1));

    job.start().await;
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn job_stops_firing_after_cancellation() {
    let refresher = Arc::new(CountingRefresher::new());
    let cancel = CancellationToken::new();
    let job = Arc::new(
        BlocklistRefreshJob::new(refresher.clone())
            .with_interval(1)
            .with_cancellation(cancel.clone()),
    );

    job.start().await;
    sleep(Duration::from_millis(1100)).await;
    cancel.cancel();
    sleep(Duration::from_millis(1100)).await;

    let calls_after_cancel = refresher.calls.load(Ordering::SeqCst);
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(refresher.calls.load(Ordering::SeqCst), calls_after_cancel);
}
