//! dnsward infrastructure layer
//!
//! Concrete adapters for the ports `dnsward-application` defines: the TLS
//! forwarder pool, the UDP/TCP listener, the blocklist HTTP refresher and
//! atomic file writer, the structured query loggers, and the Prometheus
//! metrics registry.

pub mod dns;
pub mod errors;
pub mod metrics;

pub use errors::InfraError;
pub use metrics::Metrics;
