use axum::extract::State;
use axum::routing::get;
use axum::Router;
use dnsward_infrastructure::Metrics;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn start_metrics_server(
    port: u16,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let bind_addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let app = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics);

    info!(addr = %bind_addr, "starting metrics server");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}

async fn render_metrics(State(metrics): State<Arc<Metrics>>) -> String {
    metrics.render()
}
