use serde::{Deserialize, Serialize};

/// Per-client policy override. Looked up by the handler from the client's
/// textual peer address and falls back to `Config.default_client_config`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OverridableConfig {
    #[serde(default)]
    pub reject_all_queries: bool,

    #[serde(default)]
    pub disable_blocklisting: bool,
}
