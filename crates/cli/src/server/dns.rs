use anyhow::Context;
use dnsward_application::QueryHandler;
use dnsward_infrastructure::dns::listener::{serve_tcp, serve_udp};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Runs the UDP and TCP listeners concurrently on the same address. Either
/// one returning (error or otherwise) ends both, matching spec §4.6.
pub async fn start_dns_server(
    bind_addr: SocketAddr,
    handler: Arc<QueryHandler>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    info!(addr = %bind_addr, "starting dns listener");

    let udp = serve_udp(bind_addr, handler.clone(), cancel.clone());
    let tcp = serve_tcp(bind_addr, handler, cancel.clone());

    let result = tokio::try_join!(
        async { udp.await.context("udp listener") },
        async { tcp.await.context("tcp listener") },
    );

    cancel.cancel();
    result.map(|_| ())
}
