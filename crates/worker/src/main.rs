use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gembed_core::config::WorkerConfig;
use gembed_embedder::EmbedderRegistry;
use gembed_worker::scheduler::Scheduler;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gembed_worker=debug,gembed_db=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        naptime_secs = config.naptime_secs,
        batch_size = config.batch_size,
        "Loaded worker configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gembed_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gembed_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Embedders ---
    let registry = Arc::new(EmbedderRegistry::from_env());

    // --- Scheduler ---
    let cancel = tokio_util::sync::CancellationToken::new();
    let scheduler = Scheduler::new(pool, registry, config);
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    shutdown_signal().await;

    // --- Graceful shutdown ---
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(30), scheduler_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
