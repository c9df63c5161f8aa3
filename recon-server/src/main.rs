use std::time::Duration;

use recon_server::recon::SweepWorker;
use recon_server::{Config, ServerState, init_logger};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    dotenv::dotenv().ok();
    init_logger();

    tracing::info!("Storefront reconciliation server starting...");

    // 2. Load configuration
    let config = Config::from_env();
    if config.payment_providers.is_empty() {
        tracing::warn!("No payment provider secrets configured, payment webhooks are disabled");
    }

    // 3. Initialize server state
    let state = ServerState::initialize(config.clone()).await?;

    // 4. Start the catch-up sweep worker
    let shutdown = CancellationToken::new();
    let sweep_handle = if config.sweep_interval_secs > 0 {
        let worker = SweepWorker::new(
            state.store.clone(),
            state.effects.clone(),
            Duration::from_secs(config.sweep_interval_secs),
        );
        Some(worker.spawn(shutdown.clone()))
    } else {
        tracing::info!("Sweep worker disabled (SWEEP_INTERVAL_SECS=0)");
        None
    };

    // 5. Serve HTTP
    let app = recon_server::api::build_app(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "HTTP server listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    // 6. Drain background work
    shutdown.cancel();
    if let Some(handle) = sweep_handle {
        let _ = handle.await;
    }
    tracing::info!("Server stopped");
    Ok(())
}
