use crate::server::{start_dns_server, start_metrics_server};
use dnsward_application::QueryHandler;
use dnsward_domain::Config;
use dnsward_infrastructure::dns::{
    query_logger_for, BlocklistRefresher, ForwarderPool, SwappableBlocklist,
};
use dnsward_infrastructure::Metrics;
use dnsward_jobs::{BlocklistRefreshJob, JobRunner};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const DNS_BLOCKLIST_FEED: &str =
    "https://download.dnscrypt.info/blacklists/domains/mybase.txt";
const DNS_PORT: u16 = 53;

/// Composes every component and runs them until one fails or the process is
/// asked to shut down, per spec §4.7.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let blocklist_store = Arc::new(SwappableBlocklist::new(dnsward_domain::Blocklist::empty()));
    let metrics = Arc::new(Metrics::new());
    let refresher = Arc::new(BlocklistRefresher::new(
        DNS_BLOCKLIST_FEED,
        config.blocklist_path.clone(),
        blocklist_store.clone(),
        metrics.clone(),
    ));

    info!("bootstrapping blocklist");
    refresher.bootstrap().await;

    let forwarder = Arc::new(ForwarderPool::new(config.dns_servers.clone()));
    let query_logger: Arc<dyn dnsward_application::ports::QueryLogger> =
        Arc::from(query_logger_for(config.log_queries));

    let handler = Arc::new(QueryHandler::new(
        Arc::new(config.clone()),
        blocklist_store,
        forwarder.clone(),
        query_logger,
        metrics.clone(),
    ));

    let mut tasks = tokio::task::JoinSet::new();

    {
        let forwarder = forwarder.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            forwarder.run(cancel).await;
            Ok::<(), anyhow::Error>(())
        });
    }

    {
        let handler = handler.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            start_dns_server(([0, 0, 0, 0], DNS_PORT).into(), handler, cancel).await
        });
    }

    {
        let metrics = metrics.clone();
        let cancel = cancel.clone();
        let port = config.metrics_port;
        tasks.spawn(async move { start_metrics_server(port, metrics, cancel).await });
    }

    if !config.blocklist_disable_updates {
        let job = BlocklistRefreshJob::new(refresher);
        let cancel_for_job = cancel.clone();
        tasks.spawn(async move {
            JobRunner::new()
                .with_blocklist_refresh(job.with_cancellation(cancel_for_job))
                .start()
                .await;
            Ok::<(), anyhow::Error>(())
        });
    }

    // The task group propagates cancellation bidirectionally: if any task
    // returns an error, every other task is cancelled and the error bubbles
    // to the caller.
    let mut first_error = None;
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                error!(%error, "a supervised task failed, cancelling the rest");
                cancel.cancel();
                first_error.get_or_insert(error);
            }
            Err(join_error) => {
                error!(%join_error, "a supervised task panicked, cancelling the rest");
                cancel.cancel();
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
