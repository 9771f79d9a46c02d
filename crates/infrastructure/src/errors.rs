use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfraError {
    #[error("dial {addr} failed: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tls handshake with {server_name} failed: {source}")]
    Tls {
        server_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport I/O with {addr} failed: {source}")]
    Transport {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response transaction id {got:#06x} did not match request id {expected:#06x}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("wire decode failed: {0}")]
    Decode(#[from] hickory_proto::error::ProtoError),

    #[error("blocklist download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("blocklist download returned HTTP {0}")]
    DownloadStatus(reqwest::StatusCode),

    #[error("atomic write to {path} failed: {source}")]
    AtomicWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reading blocklist {path} failed: {source}")]
    BlocklistRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    BlocklistParse(#[from] dnsward_domain::BlocklistParseError),
}
