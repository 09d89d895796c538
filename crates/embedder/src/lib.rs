//! Generation capability boundary.
//!
//! Everything that turns raw inputs into fixed-width vectors lives
//! behind the [`Embedder`] trait so the worker is testable with a
//! deterministic fake, independent of any real inference backend.
//!
//! [`Embedder`]: registry::Embedder

pub mod batch;
pub mod fake;
pub mod registry;
pub mod remote;

pub use batch::{BatchShapeError, EmbeddingBatch};
pub use fake::{FakeEmbedder, FakeMode};
pub use registry::{EmbedMethod, Embedder, EmbedderError, EmbedderRegistry, InputType};
pub use remote::RemoteEmbedder;
