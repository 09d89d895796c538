//! Embedding job entity model and DTOs.

use gembed_core::job_status::JobStatus;
use gembed_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `gembed.embedding_jobs`.
///
/// Maps a source text column to a target vector column. The worker
/// treats everything except the checkpoint fields
/// (`last_processed_id`, `last_run_at`) as read-only; definitions are
/// mutated by administrative tooling between cycles.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmbeddingJob {
    pub job_id: DbId,
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    /// Primary key column of the source table. Must be monotonically
    /// assigned (BIGSERIAL-like) for the checkpoint scheme to hold.
    pub source_id_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    /// Generation method name, resolved against the embedder registry
    /// before every generation call.
    pub method: String,
    /// Model name, validated per method and input modality.
    pub model: String,
    pub enabled: bool,
    /// Highest source id known to be fully processed for this job.
    pub last_processed_id: DbId,
    /// Timestamp of the last completed cycle, if any.
    pub last_run_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EmbeddingJob {
    /// Derived status as of `now`, matching the
    /// `embedding_job_status` view.
    pub fn status(&self, now: Timestamp) -> JobStatus {
        JobStatus::derive(self.enabled, self.last_run_at, now)
    }
}

/// DTO for inserting a new job definition.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmbeddingJob {
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub source_id_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    pub method: String,
    pub model: String,
}
