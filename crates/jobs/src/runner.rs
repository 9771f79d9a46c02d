use crate::BlocklistRefreshJob;
use std::sync::Arc;
use tracing::info;

/// Central orchestrator for dnsward's background jobs. Register jobs with
/// the builder, then call `.start()` once from the supervisor.
pub struct JobRunner {
    blocklist_refresh: Option<BlocklistRefreshJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            blocklist_refresh: None,
        }
    }

    pub fn with_blocklist_refresh(mut self, job: BlocklistRefreshJob) -> Self {
        self.blocklist_refresh = Some(job);
        self
    }

    pub async fn start(self) {
        info!("starting background job runner");

        if let Some(job) = self.blocklist_refresh {
            Arc::new(job).start().await;
        }

        info!("all background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
