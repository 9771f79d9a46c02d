use arc_swap::ArcSwap;
use dnsward_application::ports::BlocklistStore;
use dnsward_domain::Blocklist;
use std::sync::Arc;

/// Copy-on-write snapshot pointer for the live blocklist. Readers (the query
/// path) pay one atomic load per query; the refresher swaps in a whole new
/// `Arc<Blocklist>` on reload. This is the atomic-pointer alternative the
/// design notes call out as equivalent to a mutex + field pair, since the
/// handler only ever reads the snapshot once per query.
pub struct SwappableBlocklist {
    inner: ArcSwap<Blocklist>,
}

impl SwappableBlocklist {
    pub fn new(initial: Blocklist) -> Self {
        Self {
            inner: ArcSwap::from_pointee(initial),
        }
    }
}

impl BlocklistStore for SwappableBlocklist {
    fn current(&self) -> Arc<Blocklist> {
        self.inner.load_full()
    }

    fn replace(&self, new: Blocklist) {
        self.inner.store(Arc::new(new));
    }
}
