use crate::errors::InfraError;
use dnsward_application::QueryHandler;
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// EDNS(0) responses can exceed the classic 512-byte limit; 65535 covers the
/// largest possible UDP datagram.
const UDP_BUFFER_SIZE: usize = 65535;
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn serve_udp(
    bind_addr: SocketAddr,
    handler: Arc<QueryHandler>,
    cancel: CancellationToken,
) -> Result<(), InfraError> {
    let socket = Arc::new(
        UdpSocket::bind(bind_addr)
            .await
            .map_err(|source| InfraError::Transport {
                addr: bind_addr.to_string(),
                source,
            })?,
    );

    let mut buf = vec![0u8; UDP_BUFFER_SIZE];
    loop {
        let (len, client) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(addr = %bind_addr, "udp listener cancelled");
                return Ok(());
            }
            result = socket.recv_from(&mut buf) => match result {
                Ok(pair) => pair,
                Err(source) => {
                    warn!(error = %source, "udp recv failed");
                    continue;
                }
            },
        };

        let request_bytes = buf[..len].to_vec();
        let socket = socket.clone();
        let handler = handler.clone();
        tokio::spawn(async move {
            handle_datagram(socket, client, request_bytes, handler).await;
        });
    }
}

async fn handle_datagram(
    socket: Arc<UdpSocket>,
    client: SocketAddr,
    request_bytes: Vec<u8>,
    handler: Arc<QueryHandler>,
) {
    let request = match Message::from_vec(&request_bytes) {
        Ok(message) => message,
        Err(source) => {
            warn!(%client, error = %source, "dropping undecodable udp query");
            return;
        }
    };

    let client_addr = client.ip().to_string();
    let outcome = tokio::time::timeout(EXCHANGE_TIMEOUT, handler.handle(request, &client_addr)).await;

    let response = match outcome {
        Ok(Ok((response, _))) => response,
        Ok(Err(error)) => {
            error!(%client, %error, "query handling failed, dropping request");
            return;
        }
        Err(_) => {
            warn!(%client, "query handling exceeded exchange deadline");
            return;
        }
    };

    let mut wire = Vec::new();
    {
        let mut encoder = BinEncoder::new(&mut wire);
        if let Err(error) = response.emit(&mut encoder) {
            error!(%client, %error, "failed to encode udp response");
            return;
        }
    }

    match tokio::time::timeout(EXCHANGE_TIMEOUT, socket.send_to(&wire, client)).await {
        Ok(Ok(_)) => {}
        Ok(Err(source)) => warn!(%client, error = %source, "udp response write failed"),
        Err(_) => warn!(%client, "udp response write timed out"),
    }
}
