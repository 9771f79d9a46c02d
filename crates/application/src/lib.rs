//! dnsward application layer
//!
//! Ports (traits) the core request path is coded against, plus the
//! `QueryHandler` use case implementing the accept/reject decision matrix.
//! Concrete adapters for these ports live in `dnsward-infrastructure`.

pub mod errors;
pub mod job;
pub mod ports;
pub mod query_handler;

pub use errors::ApplicationError;
pub use job::Job;
pub use query_handler::{QueryHandler, QueryOutcome};
