use super::SessionCache;
use crate::errors::InfraError;
use bytes::BytesMut;
use dnsward_application::job::Job;
use dnsward_domain::Endpoint;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

const DIAL_TIMEOUT: Duration = Duration::from_secs(1);
const QUERY_DEADLINE: Duration = Duration::from_secs(2);

/// The job channel is multi-producer (handlers) and multi-consumer (one
/// worker per endpoint); `mpsc::Receiver` itself only supports a single
/// consumer, so the shared tail is guarded by a mutex each worker holds only
/// long enough to pull the next job.
pub(crate) type SharedJobs = Arc<Mutex<mpsc::Receiver<Job>>>;

/// One long-lived connection to a single upstream endpoint. Runs until the
/// job channel closes, the endpoint is cancelled, or a transport error
/// forces it to hand back the endpoint for reconnect.
pub(crate) struct Worker {
    endpoint: Endpoint,
    tls_config: Arc<ClientConfig>,
    jobs_tx: mpsc::Sender<Job>,
    jobs_rx: SharedJobs,
    reconnect: mpsc::Sender<Endpoint>,
}

/// Why a worker's run loop ended. `Cancelled` is not a failure: the caller
/// must NOT emit a reconnect token for it (spec §4.4's terminal state).
pub(crate) enum WorkerExit {
    Cancelled,
    Failed,
}

impl Worker {
    pub(crate) fn new(
        endpoint: Endpoint,
        tls_config: Arc<ClientConfig>,
        jobs_tx: mpsc::Sender<Job>,
        jobs_rx: SharedJobs,
        reconnect: mpsc::Sender<Endpoint>,
    ) -> Self {
        Self {
            endpoint,
            tls_config,
            jobs_tx,
            jobs_rx,
            reconnect,
        }
    }

    /// Dial, handshake, then serve jobs until failure or cancellation.
    /// Failure causes a reconnect token to be emitted for this endpoint and
    /// the in-flight job (if any) to be best-effort re-enqueued.
    pub(crate) async fn run(mut self, cancel: tokio_util::sync::CancellationToken) -> WorkerExit {
        let mut stream = match self.connect(&cancel).await {
            Ok(stream) => stream,
            Err(exit) => return exit,
        };

        loop {
            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => return WorkerExit::Cancelled,
                job = async { self.jobs_rx.lock().await.recv().await } => match job {
                    Some(job) => job,
                    None => return WorkerExit::Cancelled,
                },
            };

            match tokio::time::timeout(QUERY_DEADLINE, Self::exchange(&mut stream, &job.request))
                .await
            {
                Ok(Ok(response)) => job.respond(response),
                Ok(Err(err)) => {
                    warn!(addr = %self.endpoint.addr, error = %err, "upstream exchange failed");
                    self.fail_and_requeue(job).await;
                    return WorkerExit::Failed;
                }
                Err(_) => {
                    warn!(addr = %self.endpoint.addr, "upstream exchange timed out");
                    self.fail_and_requeue(job).await;
                    return WorkerExit::Failed;
                }
            }
        }
    }

    async fn connect(
        &self,
        cancel: &tokio_util::sync::CancellationToken,
    ) -> Result<TlsStream<TcpStream>, WorkerExit> {
        let addr = self.endpoint.addr.clone();
        let dial = tokio::time::timeout(DIAL_TIMEOUT, TcpStream::connect(&addr));
        let tcp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkerExit::Cancelled),
            result = dial => result,
        };
        let tcp = match tcp {
            Ok(Ok(tcp)) => tcp,
            Ok(Err(source)) => {
                let error = InfraError::Dial {
                    addr: addr.clone(),
                    source,
                };
                warn!(addr = %addr, %error, "dial failed");
                let _ = self.reconnect.send(self.endpoint.clone()).await;
                return Err(WorkerExit::Failed);
            }
            Err(_) => {
                let error = InfraError::Dial {
                    addr: addr.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::TimedOut, "dial deadline exceeded"),
                };
                warn!(addr = %addr, %error, "dial timed out");
                let _ = self.reconnect.send(self.endpoint.clone()).await;
                return Err(WorkerExit::Failed);
            }
        };
        let _ = tcp.set_nodelay(true);

        let server_name = match ServerName::try_from(self.endpoint.server_name.clone()) {
            Ok(name) => name,
            Err(source) => {
                let error = InfraError::Tls {
                    server_name: self.endpoint.server_name.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, source),
                };
                warn!(server_name = %self.endpoint.server_name, %error, "invalid server name");
                let _ = self.reconnect.send(self.endpoint.clone()).await;
                return Err(WorkerExit::Failed);
            }
        };

        let connector = TlsConnector::from(self.tls_config.clone());
        match connector.connect(server_name, tcp).await {
            Ok(stream) => {
                debug!(addr = %addr, server_name = %self.endpoint.server_name, "tls handshake complete");
                Ok(stream)
            }
            Err(source) => {
                let error = InfraError::Tls {
                    server_name: self.endpoint.server_name.clone(),
                    source,
                };
                warn!(addr = %addr, %error, "tls handshake failed");
                let _ = self.reconnect.send(self.endpoint.clone()).await;
                Err(WorkerExit::Failed)
            }
        }
    }

    /// Re-enqueues the in-flight job onto the shared job channel so another
    /// worker can retry it against a different endpoint (spec §4.4 step 3).
    /// The re-enqueue is non-blocking per the design notes: a full channel
    /// would otherwise deadlock this worker's own shutdown path. If the
    /// channel is full (or already closed), the job completes in place with
    /// a synthesized SERVFAIL reply rather than hanging until the client's
    /// deadline expires.
    async fn fail_and_requeue(&self, job: Job) {
        let _ = self.reconnect.send(self.endpoint.clone()).await;

        match self.jobs_tx.try_send(job) {
            Ok(()) => {
                debug!(addr = %self.endpoint.addr, "re-enqueued job after transport failure");
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(addr = %self.endpoint.addr, "job queue full, completing with servfail");
                let response = servfail_reply(&job.request);
                job.respond(response);
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(addr = %self.endpoint.addr, "job queue closed, completing with servfail");
                let response = servfail_reply(&job.request);
                job.respond(response);
            }
        }
    }

    async fn exchange(
        stream: &mut TlsStream<TcpStream>,
        request: &Message,
    ) -> Result<Message, InfraError> {
        let mut wire = Vec::new();
        {
            let mut encoder = BinEncoder::new(&mut wire);
            request.emit(&mut encoder)?;
        }

        let mut framed = BytesMut::with_capacity(2 + wire.len());
        framed.extend_from_slice(&(wire.len() as u16).to_be_bytes());
        framed.extend_from_slice(&wire);

        stream
            .write_all(&framed)
            .await
            .map_err(|source| InfraError::Transport {
                addr: "upstream".to_string(),
                source,
            })?;

        let mut len_buf = [0u8; 2];
        stream
            .read_exact(&mut len_buf)
            .await
            .map_err(|source| InfraError::Transport {
                addr: "upstream".to_string(),
                source,
            })?;
        let len = u16::from_be_bytes(len_buf) as usize;

        let mut response_buf = vec![0u8; len];
        stream
            .read_exact(&mut response_buf)
            .await
            .map_err(|source| InfraError::Transport {
                addr: "upstream".to_string(),
                source,
            })?;

        let response = Message::from_vec(&response_buf)?;
        validate_id(request.id(), response.id())?;
        Ok(response)
    }
}

/// A response whose transaction ID does not match its request is never
/// delivered to the caller (spec P4).
fn validate_id(expected: u16, got: u16) -> Result<(), InfraError> {
    if expected != got {
        return Err(InfraError::IdMismatch { expected, got });
    }
    Ok(())
}

/// Synthesized in place of a real upstream reply when a job can't be
/// re-enqueued after a transport failure (spec §9's suggested fallback to
/// the blocking re-enqueue the original forwarder used).
fn servfail_reply(request: &Message) -> Message {
    let mut reply = Message::new();
    reply.set_id(request.id());
    reply.set_message_type(MessageType::Response);
    reply.set_op_code(request.op_code());
    for query in request.queries() {
        reply.add_query(query.clone());
    }
    reply.set_response_code(ResponseCode::ServFail);
    reply.set_recursion_desired(request.recursion_desired());
    reply.set_recursion_available(false);
    reply
}

/// Build the shared `rustls::ClientConfig` used by every worker, backed by
/// the Mozilla root store shipped in `webpki-roots`.
pub(crate) fn tls_config(_cache: SessionCache) -> Arc<ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.resumption = rustls::client::Resumption::store(_cache);

    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::super::new_session_cache;
    use super::*;

    #[test]
    fn matching_ids_pass() {
        assert!(validate_id(0x1234, 0x1234).is_ok());
    }

    #[test]
    fn mismatched_ids_are_rejected() {
        let err = validate_id(0x1234, 0x5678).unwrap_err();
        assert!(matches!(
            err,
            InfraError::IdMismatch {
                expected: 0x1234,
                got: 0x5678
            }
        ));
    }

    fn test_worker(jobs_tx: mpsc::Sender<Job>, jobs_rx: mpsc::Receiver<Job>) -> Worker {
        let (reconnect_tx, _reconnect_rx) = mpsc::channel(1);
        let endpoint = Endpoint::new("example.com", "127.0.0.1:853");
        Worker::new(
            endpoint,
            tls_config(new_session_cache()),
            jobs_tx,
            Arc::new(Mutex::new(jobs_rx)),
            reconnect_tx,
        )
    }

    #[tokio::test]
    async fn re_enqueues_job_on_transport_failure_when_channel_has_room() {
        let (jobs_tx, jobs_rx) = mpsc::channel(1);
        let worker = test_worker(jobs_tx, jobs_rx);

        let mut request = Message::new();
        request.set_id(7);
        let (job, _response_rx) = Job::new(request);

        worker.fail_and_requeue(job).await;

        let mut rx = worker.jobs_rx.lock().await;
        let requeued = rx.try_recv().expect("job should have been re-enqueued");
        assert_eq!(requeued.request.id(), 7);
    }

    #[tokio::test]
    async fn completes_with_servfail_when_channel_is_full() {
        let (jobs_tx, jobs_rx) = mpsc::channel(1);
        let (filler, _filler_rx) = Job::new(Message::new());
        jobs_tx.try_send(filler).unwrap();

        let worker = test_worker(jobs_tx, jobs_rx);

        let mut request = Message::new();
        request.set_id(42);
        let (job, response_rx) = Job::new(request);

        worker.fail_and_requeue(job).await;

        let response = response_rx.await.expect("servfail should be delivered");
        assert_eq!(response.response_code(), ResponseCode::ServFail);
        assert_eq!(response.id(), 42);
    }
}
