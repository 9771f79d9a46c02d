use dnsward_infrastructure::dns::BlocklistRefresh;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEFAULT_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Periodic background refresh of the blocklist. No initial tick: the
/// synchronous startup bootstrap (see the supervisor) already did the first
/// load, so the first scheduled refresh happens a full interval later.
pub struct BlocklistRefreshJob {
    refresher: Arc<dyn BlocklistRefresh>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl BlocklistRefreshJob {
    pub fn new(refresher: Arc<dyn BlocklistRefresh>) -> Self {
        Self {
            refresher,
            interval_secs: DEFAULT_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "starting blocklist refresh job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("blocklist refresh job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        info!("blocklist refresh job: tick");
                        self.refresher.refresh().await;
                    }
                }
            }
        });
    }
}
