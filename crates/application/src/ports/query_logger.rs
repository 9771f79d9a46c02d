/// Outcome of a handled query, as recorded by the query logger and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Ok,
    Blocklisted,
    RejectedByClient,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Ok => "OK",
            QueryStatus::Blocklisted => "BLOCKLISTED",
            QueryStatus::RejectedByClient => "REJECTED BY CLIENT",
        }
    }
}

/// A capability with two variants: active (emits a structured line per
/// query) and inert (discards). Selected once at startup from
/// `Config.log_queries`.
pub trait QueryLogger: Send + Sync {
    fn log_query(&self, status: QueryStatus, name: &str, client: &str);
}
