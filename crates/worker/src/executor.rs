//! One job cycle: checkpoint → extract → validate → generate →
//! write → advance.
//!
//! The whole cycle runs inside a single transaction per job, so a
//! failure anywhere rolls back only this job's work and the
//! checkpoint can never advance past rows whose results were not
//! written in the same commit. Individual row writes run under
//! savepoints so one bad row cannot poison the rest of the batch.

use gembed_core::types::DbId;
use gembed_db::models::job::EmbeddingJob;
use gembed_db::repositories::{EmbeddingRepo, JobRepo, PendingRow, SourceError, SourceRepo};
use gembed_db::DbPool;
use gembed_embedder::{EmbedderRegistry, InputType};
use sqlx::Acquire;

/// How a job cycle ended.
///
/// Only `Processed` advances the checkpoint; every other variant
/// leaves the job exactly as it was, to be retried next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The job is caught up; nothing to do.
    NoPendingRows,
    /// The job's method or model failed validation. Self-healing once
    /// an administrator fixes the definition.
    InvalidConfig,
    /// The generation capability failed or was unavailable.
    GenerationFailed,
    /// Generation returned a batch that failed shape validation or
    /// did not match the extracted row count.
    InvalidBatch,
    /// Results written and checkpoint advanced.
    Processed {
        rows: usize,
        written: usize,
        new_checkpoint: DbId,
    },
}

/// Errors that abort a job cycle before its commit.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Run one cycle for one job.
pub async fn run_job(
    pool: &DbPool,
    registry: &EmbedderRegistry,
    job: &EmbeddingJob,
    batch_size: i64,
) -> Result<CycleOutcome, ExecutorError> {
    let mut tx = pool.begin().await?;

    let last_processed_id = JobRepo::last_processed_id(&mut tx, job.job_id).await?;
    tracing::debug!(
        job_id = job.job_id,
        last_processed_id,
        "Starting job cycle"
    );

    let rows = SourceRepo::find_pending(&mut tx, job, last_processed_id, batch_size).await?;
    if rows.is_empty() {
        return Ok(CycleOutcome::NoPendingRows);
    }
    tracing::info!(
        job_id = job.job_id,
        rows = rows.len(),
        "Found new rows to process"
    );

    // Definitions are mutable between cycles, so method and model are
    // re-validated on every cycle, not once at job load.
    let Some(method) = registry.validate_method(&job.method) else {
        tracing::warn!(
            job_id = job.job_id,
            method = %job.method,
            "Invalid embedding method, skipping cycle"
        );
        return Ok(CycleOutcome::InvalidConfig);
    };
    if !registry.validate_model(method, &job.model, InputType::Text) {
        tracing::warn!(
            job_id = job.job_id,
            model = %job.model,
            "Invalid model for method, skipping cycle"
        );
        return Ok(CycleOutcome::InvalidConfig);
    }
    let Some(embedder) = registry.get(method) else {
        return Ok(CycleOutcome::InvalidConfig);
    };

    let inputs: Vec<String> = rows.iter().map(|r| r.content.clone()).collect();
    let batch = match embedder.embed(&job.model, &inputs).await {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(
                job_id = job.job_id,
                error = %e,
                "Embedding generation failed, cycle aborted"
            );
            return Ok(CycleOutcome::GenerationFailed);
        }
    };

    if let Err(e) = batch.validate() {
        tracing::warn!(job_id = job.job_id, error = %e, "Invalid batch result, discarding");
        return Ok(CycleOutcome::InvalidBatch);
    }
    // A count mismatch is also disqualifying: the checkpoint advances
    // to the max extracted id, so writing only a prefix of the batch
    // would strand the remaining rows behind the new checkpoint floor.
    if batch.n_vectors != rows.len() {
        tracing::warn!(
            job_id = job.job_id,
            expected = rows.len(),
            actual = batch.n_vectors,
            "Vector count does not match extracted rows, discarding batch"
        );
        return Ok(CycleOutcome::InvalidBatch);
    }

    let mut written = 0usize;
    for (i, row) in rows.iter().enumerate() {
        // Savepoint per row: a failed write must not abort the job's
        // transaction; the row is recovered later via the
        // target-absent extraction clause.
        let mut savepoint = tx.begin().await?;
        match EmbeddingRepo::upsert(&mut savepoint, job, row.id, batch.vector(i)).await {
            Ok(()) => {
                savepoint.commit().await?;
                written += 1;
            }
            Err(e) => {
                tracing::warn!(
                    job_id = job.job_id,
                    id = row.id,
                    error = %e,
                    "Failed to write embedding, continuing with batch"
                );
                savepoint.rollback().await?;
            }
        }
    }

    // Max over the whole batch, not the last row, so progress stays
    // correct even if the extractor's ordering is ever relaxed.
    let new_checkpoint = max_identifier(&rows).unwrap_or(last_processed_id);
    JobRepo::advance_checkpoint(&mut tx, job.job_id, new_checkpoint).await?;
    tx.commit().await?;

    tracing::debug!(
        job_id = job.job_id,
        new_checkpoint,
        written,
        "Advanced checkpoint"
    );
    Ok(CycleOutcome::Processed {
        rows: rows.len(),
        written,
        new_checkpoint,
    })
}

/// Highest source id in an extracted batch.
fn max_identifier(rows: &[PendingRow]) -> Option<DbId> {
    rows.iter().map(|r| r.id).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: DbId) -> PendingRow {
        PendingRow {
            id,
            content: format!("row {id}"),
        }
    }

    #[test]
    fn max_identifier_ignores_ordering() {
        assert_eq!(max_identifier(&[row(3), row(7), row(5)]), Some(7));
    }

    #[test]
    fn max_identifier_empty_is_none() {
        assert_eq!(max_identifier(&[]), None);
    }
}
