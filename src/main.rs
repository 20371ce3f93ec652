mod app;
mod handlers;
mod models;
mod queue;
mod services;
mod storage;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::config::Config;
use app::state::AppState;
use queue::JobQueue;
use services::routing::route_watch;
use services::{HealthMonitor, HttpProcessorClient, PeerClient, ProcessorApi, WorkerPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(port = config.server_port, "starting payment dispatcher");

    let store = storage::from_env(&config).await?;
    let client: Arc<dyn ProcessorApi> = Arc::new(HttpProcessorClient::new(&config));
    let queue = JobQueue::with_capacity(config.jobs_buffer_size);
    let (route_tx, routes) = route_watch();

    tokio::spawn(
        HealthMonitor::new(client.clone(), route_tx, config.default_tolerance_ms).run(),
    );
    WorkerPool::new(queue.clone(), store.clone(), client, routes, &config).spawn();

    let peer = config
        .other_url
        .as_deref()
        .map(|url| Arc::new(PeerClient::new(url, &config)));
    let state = AppState { queue, store, peer };

    let router = Router::new()
        .route("/payments", post(handlers::payments::create_payment))
        .route("/payments-summary", get(handlers::payments_summary::get_summary))
        .route("/purge-payments", post(handlers::purge::purge_payments))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    // Graceful for the HTTP side only: workers and the health loop are
    // abandoned with the process, outstanding queued work included.
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("application closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
