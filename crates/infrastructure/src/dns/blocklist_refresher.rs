use crate::errors::InfraError;
use async_trait::async_trait;
use dnsward_application::ports::{BlocklistStore, MetricsRecorder};
use dnsward_domain::Blocklist;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("dnsward/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Port onto "refresh the blocklist once", so that `dnsward-jobs` can drive
/// this on a schedule against either the real refresher or a test double.
#[async_trait]
pub trait BlocklistRefresh: Send + Sync {
    async fn refresh(&self);
}

/// Keeps the on-disk blocklist fresh and pushes the reparsed snapshot into
/// the live `BlocklistStore`. One instance is shared between the startup
/// bootstrap and the periodic `dnsward-jobs::BlocklistRefreshJob`.
pub struct BlocklistRefresher {
    http: reqwest::Client,
    feed_url: String,
    path: String,
    store: Arc<dyn BlocklistStore>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl BlocklistRefresher {
    pub fn new(
        feed_url: impl Into<String>,
        path: impl Into<String>,
        store: Arc<dyn BlocklistStore>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .expect("static client configuration is always valid");

        Self {
            http,
            feed_url: feed_url.into(),
            path: path.into(),
            store,
            metrics,
        }
    }

    /// Startup bootstrap (spec §4.2): download only if the on-disk file is
    /// absent, then always load from disk. If the download fails on a
    /// first-run (no file at all), the store ends up empty and the caller
    /// still starts; the periodic refresh will retry.
    pub async fn bootstrap(&self) {
        if !Path::new(&self.path).exists() {
            if let Err(error) = self.download_and_write().await {
                warn!(%error, "initial blocklist download failed, starting with empty blocklist");
            }
        }

        match self.load_from_disk() {
            Ok(blocklist) => {
                info!(entries = blocklist.len(), "blocklist loaded");
                self.metrics.set_blocklist_items(blocklist.len());
                self.store.replace(blocklist);
            }
            Err(error) => {
                warn!(%error, "blocklist load failed, starting with empty blocklist");
            }
        }
    }

    /// One scheduled refresh tick (spec §4.2): download, atomically replace
    /// the on-disk file, re-parse, hot-swap into the store. Errors are
    /// logged and swallowed — the job's next tick tries again.
    pub async fn refresh(&self) {
        match self.download_and_write().await {
            Ok(()) => match self.load_from_disk() {
                Ok(blocklist) => {
                    info!(entries = blocklist.len(), "blocklist refreshed");
                    self.metrics.set_blocklist_items(blocklist.len());
                    self.store.replace(blocklist);
                }
                Err(error) => warn!(%error, "blocklist reparse after refresh failed"),
            },
            Err(error) => warn!(%error, "blocklist refresh failed"),
        }
    }

    async fn download_and_write(&self) -> Result<(), InfraError> {
        let response = self.http.get(&self.feed_url).send().await?;
        if !response.status().is_success() {
            return Err(InfraError::DownloadStatus(response.status()));
        }
        let body = response.bytes().await?;
        self.write_atomically(&body)
    }

    /// Writes `body` to a temp file in the blocklist's own directory, then
    /// renames it over the target. Readers of the old file never observe a
    /// partially written replacement (spec P6).
    fn write_atomically(&self, body: &[u8]) -> Result<(), InfraError> {
        let target = Path::new(&self.path);
        let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| InfraError::AtomicWrite {
            path: self.path.clone(),
            source,
        })?;
        std::io::Write::write_all(&mut tmp, body).map_err(|source| InfraError::AtomicWrite {
            path: self.path.clone(),
            source,
        })?;
        tmp.persist(target)
            .map_err(|e| InfraError::AtomicWrite {
                path: self.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }

    fn load_from_disk(&self) -> Result<Blocklist, InfraError> {
        let raw = std::fs::read(&self.path).map_err(|source| InfraError::BlocklistRead {
            path: self.path.clone(),
            source,
        })?;
        Ok(Blocklist::parse(Cursor::new(raw))?)
    }
}

#[async_trait]
impl BlocklistRefresh for BlocklistRefresher {
    async fn refresh(&self) {
        BlocklistRefresher::refresh(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::blocklist_store::SwappableBlocklist;

    struct NilMetrics;
    impl MetricsRecorder for NilMetrics {
        fn record_request(&self) {}
        fn record_outcome(&self, _status: dnsward_application::ports::QueryStatus, _duration: Duration) {}
        fn set_blocklist_items(&self, _count: usize) {}
    }

    #[test]
    fn atomic_write_leaves_full_new_content_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.txt");
        let store: Arc<dyn BlocklistStore> = Arc::new(SwappableBlocklist::new(Blocklist::empty()));
        let refresher = BlocklistRefresher::new(
            "http://example.invalid/list.txt",
            path.to_str().unwrap().to_string(),
            store,
            Arc::new(NilMetrics),
        );

        refresher.write_atomically(b"ads.com\n").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "ads.com\n");

        refresher.write_atomically(b"tracker.net\n").unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "tracker.net\n");
    }
}
