use crate::ports::query_logger::QueryStatus;
use std::time::Duration;

/// Metrics are updated concurrently from many handler invocations and MUST
/// be lock-free / atomic on the implementing side (see
/// `dnsward-infrastructure::metrics`, built on the `prometheus` crate's
/// atomic counter/histogram types).
pub trait MetricsRecorder: Send + Sync {
    fn record_request(&self);

    fn record_outcome(&self, status: QueryStatus, duration: Duration);

    fn set_blocklist_items(&self, count: usize);
}
