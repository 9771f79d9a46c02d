use serde::{Deserialize, Serialize};

/// Identity of one upstream DNS-over-TLS server: the TLS server name used for
/// SNI and certificate validation, plus the `host:port` to dial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Endpoint {
    pub server_name: String,
    pub addr: String,
}

impl Endpoint {
    pub fn new(server_name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            addr: addr.into(),
        }
    }
}
