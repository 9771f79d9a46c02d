use dnsward_application::ports::{QueryLogger, QueryStatus};
use tracing::debug;

/// Emits one structured log line per handled query.
pub struct ActiveQueryLogger;

impl QueryLogger for ActiveQueryLogger {
    fn log_query(&self, status: QueryStatus, name: &str, client: &str) {
        debug!(status = status.as_str(), name, client, "query handled");
    }
}

/// Discards every query. Selected when `Config.log_queries` is false.
pub struct InertQueryLogger;

impl QueryLogger for InertQueryLogger {
    fn log_query(&self, _status: QueryStatus, _name: &str, _client: &str) {}
}

/// Select the logger variant from config, matching the teacher's pattern of
/// returning a trait object chosen once at startup.
pub fn query_logger_for(log_queries: bool) -> Box<dyn QueryLogger> {
    if log_queries {
        Box::new(ActiveQueryLogger)
    } else {
        Box::new(InertQueryLogger)
    }
}
