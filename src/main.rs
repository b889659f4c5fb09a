//! ZenBridge upload worker — relays queued file transfers to Zenodo.
//!
//! Main entry point that wires the crates together and runs the
//! consumption loop until a shutdown signal arrives.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use zenbridge_core::config::AppConfig;
use zenbridge_core::error::AppError;
use zenbridge_database::repositories::queue::QueueRepository;
use zenbridge_database::repositories::transfer::TransferRepository;
use zenbridge_database::DatabasePool;
use zenbridge_worker::jobs::upload::{DepositClient, TransferStore, UploadJobHandler};
use zenbridge_worker::queue::{default_worker_id, TaskQueue};
use zenbridge_worker::runner::WorkerRunner;
use zenbridge_zenodo::ZenodoClient;

#[tokio::main]
async fn main() {
    let env = std::env::var("ZENBRIDGE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Worker error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main worker run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting ZenBridge worker v{}", env!("CARGO_PKG_VERSION"));

    if !config.worker.enabled {
        tracing::warn!("Worker is disabled in configuration; exiting");
        return Ok(());
    }

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    zenbridge_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Repositories and Zenodo client ───────────────────
    let transfer_repo = Arc::new(TransferRepository::new(db.pool().clone()));
    let queue_repo = Arc::new(QueueRepository::new(db.pool().clone()));
    let zenodo = ZenodoClient::new(&config.zenodo)?;

    // ── Step 3: Task queue and handler ───────────────────────────
    let worker_id = config
        .worker
        .worker_id
        .clone()
        .unwrap_or_else(default_worker_id);

    let queue = Arc::new(TaskQueue::new(
        Arc::clone(&queue_repo),
        &config.queue,
        worker_id,
    ));

    let handler = Arc::new(UploadJobHandler::new(
        Arc::clone(&transfer_repo) as Arc<dyn TransferStore>,
        Arc::new(zenodo) as Arc<dyn DepositClient>,
    ));

    let runner = WorkerRunner::new(Arc::clone(&queue), handler, config.worker.clone());

    // ── Step 4: Run until shutdown signal ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, finishing in-flight work...");
        let _ = shutdown_tx.send(true);
    });

    runner.run(shutdown_rx).await;

    db.close().await;
    tracing::info!("ZenBridge worker shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
