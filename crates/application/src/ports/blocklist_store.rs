use dnsward_domain::Blocklist;
use std::sync::Arc;

/// The handler's live blocklist reference. The query path reads it once per
/// query; the refresher replaces the whole snapshot on a hot swap. A copy-on-
/// write pointer (e.g. `arc_swap::ArcSwap`) is the natural implementation.
pub trait BlocklistStore: Send + Sync {
    fn current(&self) -> Arc<Blocklist>;

    fn replace(&self, new: Blocklist);
}
