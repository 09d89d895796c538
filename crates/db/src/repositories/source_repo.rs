//! Batch extraction from job source tables.
//!
//! Finds rows whose id is past the job's checkpoint and whose target
//! value is still unset. The target-absent clause makes the scan
//! self-healing: a row whose write was lost is picked back up by a
//! later cycle as long as the checkpoint has not moved past it, while
//! the id floor keeps the per-cycle scan cost proportional to new
//! arrivals rather than to total table size.

use gembed_core::error::CoreError;
use gembed_core::ident::{quote_ident, quote_qualified};
use gembed_core::types::DbId;
use sqlx::PgConnection;

use crate::models::job::EmbeddingJob;

/// One extracted source row awaiting embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub id: DbId,
    pub content: String,
}

/// Errors from batch extraction.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The job definition names an unusable schema/table/column.
    #[error("invalid job definition: {0}")]
    Definition(#[from] CoreError),

    /// A selected row has a NULL id. Aborts the batch: the checkpoint
    /// scheme cannot represent progress past an unidentifiable row.
    #[error("NULL id value in source row at position {position}")]
    NullId { position: usize },

    /// A selected row has a NULL content value. Aborts the batch
    /// rather than skipping, so upstream data-quality problems
    /// surface instead of being masked.
    #[error("NULL content value in source row with id {id}")]
    NullContent { id: DbId },

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Finds the next bounded batch of unprocessed source rows for a job.
pub struct SourceRepo;

impl SourceRepo {
    /// Extract up to `limit` pending rows for `job`, ordered ascending
    /// by source id, starting strictly after `last_processed_id`.
    ///
    /// Returns an empty vector when the job is caught up; that is not
    /// an error.
    pub async fn find_pending(
        conn: &mut PgConnection,
        job: &EmbeddingJob,
        last_processed_id: DbId,
        limit: i64,
    ) -> Result<Vec<PendingRow>, SourceError> {
        let query = pending_rows_sql(job)?;

        let raw: Vec<(Option<DbId>, Option<String>)> = sqlx::query_as(&query)
            .bind(last_processed_id)
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;

        let mut rows = Vec::with_capacity(raw.len());
        for (position, (id, content)) in raw.into_iter().enumerate() {
            let id = id.ok_or(SourceError::NullId { position })?;
            let content = content.ok_or(SourceError::NullContent { id })?;
            if content.is_empty() {
                tracing::warn!(job_id = job.job_id, id, "Empty content in source row");
            }
            rows.push(PendingRow { id, content });
        }
        Ok(rows)
    }
}

/// Build the pending-rows query for a job.
///
/// `$1` binds the checkpoint floor, `$2` the row limit. All
/// identifiers come from the job definition and are quoted.
pub fn pending_rows_sql(job: &EmbeddingJob) -> Result<String, CoreError> {
    let source = quote_qualified(&job.source_schema, &job.source_table)?;
    let target = quote_qualified(&job.target_schema, &job.target_table)?;
    let id_col = quote_ident(&job.source_id_column)?;
    let content_col = quote_ident(&job.source_column)?;
    let target_col = quote_ident(&job.target_column)?;

    Ok(format!(
        "SELECT s.{id_col}, s.{content_col} \
         FROM {source} s \
         LEFT JOIN {target} t ON s.{id_col} = t.{id_col} \
         WHERE s.{id_col} > $1 AND (t.{id_col} IS NULL OR t.{target_col} IS NULL) \
         ORDER BY s.{id_col} \
         LIMIT $2"
    ))
}
