//! Deterministic in-process embedder for tests.
//!
//! Produces fixed-dimension vectors derived from the input bytes, so
//! the same input always embeds to the same vector. Failure and
//! malformed-shape modes let tests drive the executor's error paths
//! without a real backend.

use async_trait::async_trait;

use crate::batch::EmbeddingBatch;
use crate::registry::{EmbedMethod, Embedder, EmbedderError, InputType};

/// What the fake returns when asked to embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeMode {
    /// Well-formed deterministic vectors.
    Ok,
    /// Every call fails with a generation error.
    Fail,
    /// A batch that violates the shape invariant (zero dimension).
    Malformed,
    /// One vector fewer than the number of inputs.
    ShortBatch,
}

/// Deterministic generator implementing the `fake` method.
pub struct FakeEmbedder {
    dim: usize,
    mode: FakeMode,
    /// Permitted model names; empty means any model is allowed.
    allowed_models: Vec<String>,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            mode: FakeMode::Ok,
            allowed_models: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: FakeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_allowed_models(mut self, models: Vec<String>) -> Self {
        self.allowed_models = models;
        self
    }

    /// The deterministic vector for one input: an FNV-1a hash of the
    /// bytes, fanned out across `dim` components in `[0, 1)`.
    pub fn vector_for(&self, input: &str) -> Vec<f32> {
        let seed = input
            .bytes()
            .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
        (0..self.dim)
            .map(|j| (seed.wrapping_add(j as u32) % 1000) as f32 / 1000.0)
            .collect()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn method(&self) -> EmbedMethod {
        EmbedMethod::Fake
    }

    fn is_model_allowed(&self, model: &str, _input_type: InputType) -> bool {
        self.allowed_models.is_empty() || self.allowed_models.iter().any(|m| m == model)
    }

    async fn embed(
        &self,
        _model: &str,
        inputs: &[String],
    ) -> Result<EmbeddingBatch, EmbedderError> {
        if inputs.is_empty() {
            return Err(EmbedderError::EmptyInput);
        }

        match self.mode {
            FakeMode::Fail => Err(EmbedderError::Generation(
                "fake embedder configured to fail".into(),
            )),
            FakeMode::Malformed => Ok(EmbeddingBatch {
                n_vectors: inputs.len(),
                dim: 0,
                data: Vec::new(),
            }),
            FakeMode::ShortBatch => {
                let rows: Vec<Vec<f32>> = inputs
                    .iter()
                    .take(inputs.len() - 1)
                    .map(|s| self.vector_for(s))
                    .collect();
                if rows.is_empty() {
                    return Ok(EmbeddingBatch {
                        n_vectors: 0,
                        dim: self.dim,
                        data: Vec::new(),
                    });
                }
                EmbeddingBatch::from_rows(rows)
                    .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))
            }
            FakeMode::Ok => {
                let rows: Vec<Vec<f32>> =
                    inputs.iter().map(|s| self.vector_for(s)).collect();
                EmbeddingBatch::from_rows(rows)
                    .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_input_yields_same_vector() {
        let fake = FakeEmbedder::new(4);
        let a = fake.embed("m", &["hello".into()]).await.unwrap();
        let b = fake.embed("m", &["hello".into()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dim, 4);
        assert_eq!(a.n_vectors, 1);
    }

    #[tokio::test]
    async fn different_inputs_yield_different_vectors() {
        let fake = FakeEmbedder::new(4);
        let batch = fake
            .embed("m", &["hello".into(), "world".into()])
            .await
            .unwrap();
        assert_ne!(batch.vector(0), batch.vector(1));
    }

    #[tokio::test]
    async fn components_stay_in_unit_range() {
        let fake = FakeEmbedder::new(8);
        let batch = fake.embed("m", &["anything at all".into()]).await.unwrap();
        assert!(batch.data.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[tokio::test]
    async fn fail_mode_errors() {
        let fake = FakeEmbedder::new(4).with_mode(FakeMode::Fail);
        assert!(fake.embed("m", &["x".into()]).await.is_err());
    }

    #[tokio::test]
    async fn malformed_mode_fails_shape_validation() {
        let fake = FakeEmbedder::new(4).with_mode(FakeMode::Malformed);
        let batch = fake.embed("m", &["x".into()]).await.unwrap();
        assert!(batch.validate().is_err());
    }

    #[tokio::test]
    async fn short_batch_mode_drops_one_vector() {
        let fake = FakeEmbedder::new(4).with_mode(FakeMode::ShortBatch);
        let batch = fake
            .embed("m", &["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        assert_eq!(batch.n_vectors, 2);
        assert!(batch.validate().is_ok());
    }
}
