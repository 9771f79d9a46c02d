pub mod blocklist_refresher;
pub mod blocklist_store;
pub mod forwarder;
pub mod listener;
pub mod query_logger;

pub use blocklist_refresher::{BlocklistRefresh, BlocklistRefresher};
pub use blocklist_store::SwappableBlocklist;
pub use forwarder::ForwarderPool;
pub use query_logger::{query_logger_for, ActiveQueryLogger, InertQueryLogger};
