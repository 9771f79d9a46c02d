pub mod blocklist_store;
pub mod forwarder;
pub mod metrics_recorder;
pub mod query_logger;

pub use blocklist_store::BlocklistStore;
pub use forwarder::Forwarder;
pub use metrics_recorder::MetricsRecorder;
pub use query_logger::{QueryLogger, QueryStatus};
