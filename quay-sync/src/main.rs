//! quay-sync — marketplace inventory reconciliation service
//!
//! Long-running service that:
//! - Drains stock-change deliveries into the request ledger (IntakeWorker)
//! - Reconciles pending inventory per channel on a schedule (ReconcileWorker)
//! - Serves the internal ops surface (health + enqueue adapter)

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use quay_sync::api;
use quay_sync::config::Config;
use quay_sync::db::DbService;
use quay_sync::intake::{INTAKE_QUEUE_DEPTH, IntakeWorker};
use quay_sync::marketplace::{HmacSha256Signer, MarketplaceApi, MarketplaceClient};
use quay_sync::reconcile::ReconcileWorker;
use quay_sync::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quay_sync=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting quay-sync (env: {})", config.environment);

    let db = DbService::open(&config.database_path).await?;

    let signer = Arc::new(HmacSha256Signer::new(config.app_secret.clone()));
    let marketplace: Arc<dyn MarketplaceApi> =
        Arc::new(MarketplaceClient::new(&config, signer)?);

    let (intake_tx, intake_rx) = mpsc::channel(INTAKE_QUEUE_DEPTH);
    let shutdown = CancellationToken::new();

    // Background workers
    let intake = IntakeWorker::new(
        db.pool.clone(),
        config.channel_type.clone(),
        shutdown.clone(),
    );
    let intake_handle = tokio::spawn(intake.run(intake_rx));

    let reconcile = ReconcileWorker::new(
        db.pool.clone(),
        marketplace.clone(),
        Duration::from_secs(config.reconcile_interval_secs),
        shutdown.clone(),
    );
    let reconcile_handle = tokio::spawn(reconcile.run());

    // Ops surface
    let state = AppState {
        db: db.clone(),
        marketplace,
        intake_tx,
    };
    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("quay-sync HTTP listening on {addr}");

    let server_shutdown = shutdown.clone();
    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!("HTTP server error: {e}");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.cancel();

    let _ = intake_handle.await;
    let _ = reconcile_handle.await;
    let _ = server_handle.await;

    tracing::info!("quay-sync stopped");
    Ok(())
}
