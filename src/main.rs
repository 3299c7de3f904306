//! Cutout Server — async image background removal service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use cutout_core::config::AppConfig;
use cutout_core::error::AppError;
use cutout_core::metrics::MetricsStore;
use cutout_core::traits::{BackgroundRemover, ObjectStorage};
use cutout_queue::{JobQueue, RedisClient, RedisJobQueue};
use cutout_service::HttpBackgroundRemover;
use cutout_storage::S3ObjectStorage;
use cutout_worker::{CleanupScheduler, JobContext, JobExecutor, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("CUTOUT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
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
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Cutout v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Queue backend ────────────────────────────────────
    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::connect(&config.queue).await?;
    let queue: Arc<dyn JobQueue> =
        Arc::new(RedisJobQueue::new(redis_client, config.queue.name.clone()));
    tracing::info!("Queue backend ready");

    // ── Step 2: Object storage ───────────────────────────────────
    tracing::info!("Initializing object storage...");
    let s3 = S3ObjectStorage::new(&config.storage);
    s3.ensure_bucket().await?;
    let storage: Arc<dyn ObjectStorage> = Arc::new(s3);
    tracing::info!("Object storage ready (bucket: {})", config.storage.bucket);

    // ── Step 3: Shared singletons ────────────────────────────────
    let metrics = Arc::new(MetricsStore::new());
    let remover: Arc<dyn BackgroundRemover> =
        Arc::new(HttpBackgroundRemover::new(&config.remover)?);

    let app_state = cutout_api::state::AppState::new(
        Arc::clone(&config),
        Arc::clone(&queue),
        Arc::clone(&storage),
        remover,
        Arc::clone(&metrics),
    );

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Background worker ────────────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting background worker...");

        let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let ctx = JobContext {
            queue: Arc::clone(&queue),
            storage: Arc::clone(&storage),
            removal: app_state.removal.clone(),
            metrics: Arc::clone(&metrics),
        };
        let executor = Arc::new(JobExecutor::new(ctx));
        let runner = WorkerRunner::new(
            Arc::clone(&queue),
            executor,
            config.worker.clone(),
            worker_id,
        );

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });
        tracing::info!("Background worker started");
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 6: Cleanup scheduler ────────────────────────────────
    let scheduler_handle = if config.cleanup.enabled {
        let scheduler =
            CleanupScheduler::new(Arc::clone(&queue), config.cleanup.clone(), &config.queue);
        let scheduler_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            scheduler.run(scheduler_cancel).await;
        });
        tracing::info!("Cleanup scheduler started");
        Some(handle)
    } else {
        tracing::info!("Cleanup scheduler disabled");
        None
    };

    // ── Step 7: HTTP server ──────────────────────────────────────
    let app = cutout_api::router::build_router(app_state)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("Cutout server listening on {addr}");

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }
    if let Some(handle) = scheduler_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(10), handle).await;
    }

    tracing::info!("Cutout server shut down gracefully");
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
