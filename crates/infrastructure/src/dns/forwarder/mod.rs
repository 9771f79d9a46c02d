mod pool;
mod worker;

pub use pool::ForwarderPool;

use rustls::client::ClientSessionMemoryCache;
use std::sync::Arc;

/// Shared TLS session-resumption cache handed to every worker. Backed by
/// `rustls`'s own in-memory LRU, which is internally synchronized — the
/// single instance is safe to clone (it's an `Arc` under the hood) across
/// worker tasks.
pub type SessionCache = Arc<ClientSessionMemoryCache>;

pub(crate) fn new_session_cache() -> SessionCache {
    Arc::new(ClientSessionMemoryCache::new(256))
}
