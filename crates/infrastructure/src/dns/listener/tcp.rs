use crate::errors::InfraError;
use dnsward_application::QueryHandler;
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn serve_tcp(
    bind_addr: SocketAddr,
    handler: Arc<QueryHandler>,
    cancel: CancellationToken,
) -> Result<(), InfraError> {
    let listener =
        TcpListener::bind(bind_addr)
            .await
            .map_err(|source| InfraError::Transport {
                addr: bind_addr.to_string(),
                source,
            })?;

    loop {
        let (stream, client) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(addr = %bind_addr, "tcp listener cancelled");
                return Ok(());
            }
            result = listener.accept() => match result {
                Ok(pair) => pair,
                Err(source) => {
                    warn!(error = %source, "tcp accept failed");
                    continue;
                }
            },
        };

        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(error) = handle_connection(stream, client, handler).await {
                warn!(%client, %error, "tcp query handling failed");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    client: SocketAddr,
    handler: Arc<QueryHandler>,
) -> Result<(), InfraError> {
    let mut len_buf = [0u8; 2];
    tokio::time::timeout(EXCHANGE_TIMEOUT, stream.read_exact(&mut len_buf))
        .await
        .map_err(|_| timeout_error(client))?
        .map_err(|source| InfraError::Transport {
            addr: client.to_string(),
            source,
        })?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut request_buf = vec![0u8; len];
    tokio::time::timeout(EXCHANGE_TIMEOUT, stream.read_exact(&mut request_buf))
        .await
        .map_err(|_| timeout_error(client))?
        .map_err(|source| InfraError::Transport {
            addr: client.to_string(),
            source,
        })?;

    let request = Message::from_vec(&request_buf)?;
    let client_addr = client.ip().to_string();

    let (response, _) = tokio::time::timeout(EXCHANGE_TIMEOUT, handler.handle(request, &client_addr))
        .await
        .map_err(|_| timeout_error(client))?
        .map_err(|error| {
            error!(%client, %error, "query handling failed");
            InfraError::Transport {
                addr: client.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, error.to_string()),
            }
        })?;

    let mut wire = Vec::new();
    {
        let mut encoder = BinEncoder::new(&mut wire);
        response.emit(&mut encoder)?;
    }

    let mut framed = Vec::with_capacity(2 + wire.len());
    framed.extend_from_slice(&(wire.len() as u16).to_be_bytes());
    framed.extend_from_slice(&wire);

    tokio::time::timeout(EXCHANGE_TIMEOUT, stream.write_all(&framed))
        .await
        .map_err(|_| timeout_error(client))?
        .map_err(|source| InfraError::Transport {
            addr: client.to_string(),
            source,
        })?;

    Ok(())
}

fn timeout_error(client: SocketAddr) -> InfraError {
    InfraError::Transport {
        addr: client.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::TimedOut, "exchange deadline exceeded"),
    }
}
