use crate::errors::ApplicationError;
use crate::job::Job;
use async_trait::async_trait;

/// Application-layer port onto the forwarder pool. The implementation (in
/// `dnsward-infrastructure`) owns the bounded job channel, the per-endpoint
/// TLS workers, and the reconnect logic; this trait only exposes the single
/// operation the handler needs.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Blocks until `job` is accepted into the bounded job channel.
    /// Back-pressure from that channel is the sole admission control.
    async fn submit(&self, job: Job) -> Result<(), ApplicationError>;
}
