//! Repository for the `gembed.embedding_jobs` registry.
//!
//! The worker uses `list_enabled`, `last_processed_id`, and
//! `advance_checkpoint`; the remaining methods back administrative
//! tooling and tests.

use gembed_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::job::{EmbeddingJob, NewEmbeddingJob};

/// Column list for `embedding_jobs` queries.
const COLUMNS: &str = "\
    job_id, source_schema, source_table, source_column, source_id_column, \
    target_schema, target_table, target_column, method, model, enabled, \
    last_processed_id, last_run_at, created_at, updated_at";

/// Durable registry of job definitions and per-job checkpoints.
pub struct JobRepo;

impl JobRepo {
    /// List all enabled job definitions. No ordering guarantee.
    pub async fn list_enabled(pool: &PgPool) -> Result<Vec<EmbeddingJob>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM gembed.embedding_jobs WHERE enabled = TRUE");
        sqlx::query_as::<_, EmbeddingJob>(&query)
            .fetch_all(pool)
            .await
    }

    /// Read the checkpoint for a job, defaulting to the zero floor when
    /// the job has never run. Never errors for a valid job id.
    pub async fn last_processed_id(
        conn: &mut PgConnection,
        job_id: DbId,
    ) -> Result<DbId, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT last_processed_id FROM gembed.embedding_jobs WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(|(id,)| id).unwrap_or(0))
    }

    /// Advance a job's checkpoint and stamp `last_run_at`.
    ///
    /// `GREATEST` makes the update monotonic: a caller passing a value
    /// below the stored checkpoint degrades to a timestamp-only update
    /// instead of moving progress backwards.
    pub async fn advance_checkpoint(
        conn: &mut PgConnection,
        job_id: DbId,
        new_last_processed_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE gembed.embedding_jobs \
             SET last_processed_id = GREATEST(last_processed_id, $2), \
                 last_run_at = NOW(), \
                 updated_at = NOW() \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(new_last_processed_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Find a job by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        job_id: DbId,
    ) -> Result<Option<EmbeddingJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM gembed.embedding_jobs WHERE job_id = $1");
        sqlx::query_as::<_, EmbeddingJob>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new job definition, enabled, with a zero checkpoint.
    pub async fn insert(
        pool: &PgPool,
        input: &NewEmbeddingJob,
    ) -> Result<EmbeddingJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO gembed.embedding_jobs \
                 (source_schema, source_table, source_column, source_id_column, \
                  target_schema, target_table, target_column, method, model) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmbeddingJob>(&query)
            .bind(&input.source_schema)
            .bind(&input.source_table)
            .bind(&input.source_column)
            .bind(&input.source_id_column)
            .bind(&input.target_schema)
            .bind(&input.target_table)
            .bind(&input.target_column)
            .bind(&input.method)
            .bind(&input.model)
            .fetch_one(pool)
            .await
    }

    /// Enable or disable a job. Returns `false` if the job does not exist.
    pub async fn set_enabled(
        pool: &PgPool,
        job_id: DbId,
        enabled: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE gembed.embedding_jobs \
             SET enabled = $2, updated_at = NOW() \
             WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(enabled)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
