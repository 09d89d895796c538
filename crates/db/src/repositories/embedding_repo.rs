//! Idempotent persistence of computed vectors into job target tables.
//!
//! Uses an update-else-insert sequence instead of a native
//! `INSERT ... ON CONFLICT` so no unique constraint is required on the
//! target table. Repeating the sequence with the same id and vector
//! leaves the row in the same final state.

use gembed_core::error::CoreError;
use gembed_core::ident::{quote_ident, quote_qualified};
use gembed_core::types::DbId;
use sqlx::PgConnection;

use crate::models::job::EmbeddingJob;

/// Writes computed vectors into a job's target table.
pub struct EmbeddingRepo;

impl EmbeddingRepo {
    /// Upsert one vector keyed by the source row id.
    ///
    /// Attempts an `UPDATE` first; if no row matched, performs an
    /// `INSERT`. The vector is passed as a pgvector literal and cast
    /// server-side.
    pub async fn upsert(
        conn: &mut PgConnection,
        job: &EmbeddingJob,
        id: DbId,
        vector: &[f32],
    ) -> Result<(), UpsertError> {
        let literal = vector_literal(vector);

        let update = update_sql(job)?;
        let result = sqlx::query(&update)
            .bind(&literal)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            let insert = insert_sql(job)?;
            sqlx::query(&insert)
                .bind(id)
                .bind(&literal)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

/// Errors from the result writer.
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    #[error("invalid job definition: {0}")]
    Definition(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// `UPDATE <target> SET <col> = $1::vector WHERE <id> = $2`.
pub fn update_sql(job: &EmbeddingJob) -> Result<String, CoreError> {
    let target = quote_qualified(&job.target_schema, &job.target_table)?;
    let target_col = quote_ident(&job.target_column)?;
    let id_col = quote_ident(&job.source_id_column)?;
    Ok(format!(
        "UPDATE {target} SET {target_col} = $1::vector WHERE {id_col} = $2"
    ))
}

/// `INSERT INTO <target> (<id>, <col>) VALUES ($1, $2::vector)`.
pub fn insert_sql(job: &EmbeddingJob) -> Result<String, CoreError> {
    let target = quote_qualified(&job.target_schema, &job.target_table)?;
    let target_col = quote_ident(&job.target_column)?;
    let id_col = quote_ident(&job.source_id_column)?;
    Ok(format!(
        "INSERT INTO {target} ({id_col}, {target_col}) VALUES ($1, $2::vector)"
    ))
}

/// Render a vector as a pgvector text literal: `[0.1,0.2,0.3]`.
pub fn vector_literal(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * 12 + 2);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job() -> EmbeddingJob {
        EmbeddingJob {
            job_id: 1,
            source_schema: "public".into(),
            source_table: "documents".into(),
            source_column: "body".into(),
            source_id_column: "doc_id".into(),
            target_schema: "public".into(),
            target_table: "document_embeddings".into(),
            target_column: "embedding".into(),
            method: "remote".into(),
            model: "test-model".into(),
            enabled: true,
            last_processed_id: 0,
            last_run_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn update_sql_targets_the_vector_column() {
        assert_eq!(
            update_sql(&job()).unwrap(),
            "UPDATE \"public\".\"document_embeddings\" \
             SET \"embedding\" = $1::vector WHERE \"doc_id\" = $2"
        );
    }

    #[test]
    fn insert_sql_carries_id_and_vector() {
        assert_eq!(
            insert_sql(&job()).unwrap(),
            "INSERT INTO \"public\".\"document_embeddings\" \
             (\"doc_id\", \"embedding\") VALUES ($1, $2::vector)"
        );
    }

    #[test]
    fn vector_literal_brackets_and_commas() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn vector_literal_single_element() {
        assert_eq!(vector_literal(&[3.0]), "[3]");
    }
}
