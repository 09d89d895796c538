//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods.
//! Methods that only ever run standalone take `&PgPool`; methods that
//! participate in a job cycle's transaction take `&mut PgConnection`
//! so the executor can run extraction, writes, and the checkpoint
//! advance under one commit.

pub mod embedding_repo;
pub mod job_repo;
pub mod source_repo;

pub use embedding_repo::EmbeddingRepo;
pub use job_repo::JobRepo;
pub use source_repo::{PendingRow, SourceError, SourceRepo};
