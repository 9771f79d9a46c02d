use super::worker::{self, SharedJobs, Worker, WorkerExit};
use super::new_session_cache;
use dnsward_application::errors::ApplicationError;
use dnsward_application::job::Job;
use dnsward_application::ports::Forwarder;
use dnsward_domain::Endpoint;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const JOBS_CAPACITY: usize = 16;
/// Burst of 2 reconnect starts per second, enforced with a simple token
/// refill: one permit added every half second, capped at 2 in flight.
const RECONNECT_BURST: usize = 2;
const RECONNECT_REFILL: Duration = Duration::from_millis(500);

/// Fixed set of upstream endpoints, each serviced by one long-lived TLS
/// worker sharing a single bounded job queue. `submit` is the only
/// operation the query handler sees; `run` is driven by the supervisor.
pub struct ForwarderPool {
    jobs_tx: mpsc::Sender<Job>,
    jobs_rx: SharedJobs,
    endpoints: Vec<Endpoint>,
}

impl ForwarderPool {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel(JOBS_CAPACITY);
        Self {
            jobs_tx,
            jobs_rx: Arc::new(Mutex::new(jobs_rx)),
            endpoints,
        }
    }

    /// Starts one worker per configured endpoint and reconnects failed
    /// ones, rate-limited across the whole pool. Returns once `cancel` is
    /// signalled and every worker has exited.
    pub async fn run(&self, cancel: CancellationToken) {
        let tls_config = worker::tls_config(new_session_cache());
        let (reconnect_tx, mut reconnect_rx) = mpsc::channel::<Endpoint>(self.endpoints.len().max(1));

        let mut tasks = tokio::task::JoinSet::new();
        for endpoint in &self.endpoints {
            tasks.spawn(Self::spawn_worker(
                endpoint.clone(),
                tls_config.clone(),
                self.jobs_tx.clone(),
                self.jobs_rx.clone(),
                reconnect_tx.clone(),
                cancel.clone(),
            ));
        }

        let mut permits = RECONNECT_BURST;
        let mut refill = interval(RECONNECT_REFILL);
        refill.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = refill.tick() => {
                    if permits < RECONNECT_BURST {
                        permits += 1;
                    }
                }
                Some(endpoint) = reconnect_rx.recv() => {
                    if permits == 0 {
                        // Wait for the next refill tick before honoring this
                        // token; the endpoint stays unserved until then.
                        refill.tick().await;
                    } else {
                        permits -= 1;
                    }
                    info!(addr = %endpoint.addr, "reconnecting endpoint");
                    tasks.spawn(Self::spawn_worker(
                        endpoint,
                        tls_config.clone(),
                        self.jobs_tx.clone(),
                        self.jobs_rx.clone(),
                        reconnect_tx.clone(),
                        cancel.clone(),
                    ));
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}
    }

    async fn spawn_worker(
        endpoint: Endpoint,
        tls_config: Arc<rustls::ClientConfig>,
        jobs_tx: mpsc::Sender<Job>,
        jobs_rx: SharedJobs,
        reconnect: mpsc::Sender<Endpoint>,
        cancel: CancellationToken,
    ) {
        let addr = endpoint.addr.clone();
        let exit = Worker::new(endpoint, tls_config, jobs_tx, jobs_rx, reconnect)
            .run(cancel)
            .await;
        match exit {
            WorkerExit::Cancelled => info!(addr = %addr, "worker exiting on cancellation"),
            WorkerExit::Failed => warn!(addr = %addr, "worker exiting after transport failure"),
        }
    }
}

#[async_trait]
impl Forwarder for ForwarderPool {
    async fn submit(&self, job: Job) -> Result<(), ApplicationError> {
        self.jobs_tx
            .send(job)
            .await
            .map_err(|_| ApplicationError::ForwarderUnavailable)
    }
}
