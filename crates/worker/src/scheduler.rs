//! Naptime loop that drives all enabled jobs.
//!
//! The scheduler sleeps for the configured naptime, wakes, runs one
//! cycle for every enabled job in turn, and goes back to sleep. A
//! SIGHUP re-reads the worker configuration from the environment so
//! naptime and batch size can change without a restart.

use std::sync::Arc;
use std::time::Duration;

use gembed_core::config::WorkerConfig;
use gembed_db::repositories::JobRepo;
use gembed_db::DbPool;
use gembed_embedder::EmbedderRegistry;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::executor::{self, CycleOutcome};

pub struct Scheduler {
    pool: DbPool,
    registry: Arc<EmbedderRegistry>,
    config: WorkerConfig,
}

impl Scheduler {
    pub fn new(pool: DbPool, registry: Arc<EmbedderRegistry>, config: WorkerConfig) -> Self {
        Self {
            pool,
            registry,
            config: config.clamped(),
        }
    }

    /// Run until the token is cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut reload = match signal(SignalKind::hangup()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGHUP handler, config reload disabled");
                None
            }
        };

        tracing::info!(
            naptime_secs = self.config.naptime_secs,
            batch_size = self.config.batch_size,
            "Embedding scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Embedding scheduler shutting down");
                    break;
                }
                _ = recv_or_pending(&mut reload) => {
                    self.reload_config();
                    continue;
                }
                _ = tokio::time::sleep(Duration::from_secs(self.config.naptime_secs)) => {}
            }

            self.run_cycle(&cancel).await;
        }
    }

    /// One wake-up: process every enabled job once.
    async fn run_cycle(&self, cancel: &CancellationToken) {
        let jobs = match JobRepo::list_enabled(&self.pool).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load embedding jobs");
                return;
            }
        };
        if jobs.is_empty() {
            tracing::debug!("No enabled embedding jobs");
            return;
        }

        for job in &jobs {
            if cancel.is_cancelled() {
                return;
            }
            tracing::debug!(
                job_id = job.job_id,
                status = job.status(chrono::Utc::now()).label(),
                "Running job cycle"
            );
            match executor::run_job(&self.pool, &self.registry, job, self.config.batch_size).await
            {
                Ok(CycleOutcome::Processed {
                    rows,
                    written,
                    new_checkpoint,
                }) => {
                    tracing::info!(
                        job_id = job.job_id,
                        rows,
                        written,
                        new_checkpoint,
                        "Processed embedding batch"
                    );
                }
                Ok(CycleOutcome::NoPendingRows) => {
                    tracing::debug!(job_id = job.job_id, "Job is caught up");
                }
                // Already logged with context at the failure site.
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(job_id = job.job_id, error = %e, "Error processing job");
                }
            }
        }
    }

    fn reload_config(&mut self) {
        let fresh = WorkerConfig::from_env().clamped();
        if fresh != self.config {
            tracing::info!(
                naptime_secs = fresh.naptime_secs,
                batch_size = fresh.batch_size,
                "Reloaded worker configuration"
            );
            self.config = fresh;
        } else {
            tracing::debug!("Configuration reload requested, no changes");
        }
    }
}

/// Awaits the next signal, or forever when the handler is absent.
async fn recv_or_pending(sig: &mut Option<Signal>) {
    match sig {
        Some(sig) => {
            sig.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
