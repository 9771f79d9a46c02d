//! dnsward domain layer
//!
//! Pure data and pure logic: no I/O, no async runtime. Everything here is
//! safe to unit test without a `tokio` executor.

pub mod blocklist;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod overridable_config;

pub use blocklist::{Blocklist, BlocklistParseError};
pub use config::Config;
pub use endpoint::Endpoint;
pub use errors::ConfigError;
pub use overridable_config::OverridableConfig;
