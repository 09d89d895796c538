//! Embedder trait, method/model validation, and the registry.
//!
//! Job definitions carry method and model as free-form text and are
//! mutable by administrators between cycles, so the executor
//! re-validates both against the registry before every generation
//! call. A previously valid pairing may have been invalidated since
//! the last cycle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::batch::EmbeddingBatch;

/// Known generation methods, resolved from the job's `method` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMethod {
    /// Remote embedding service reached over HTTP.
    Remote,
    /// Deterministic in-process generator for tests.
    Fake,
}

impl EmbedMethod {
    /// Resolve a method name to the corresponding variant.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "remote" => Some(Self::Remote),
            "fake" => Some(Self::Fake),
            _ => None,
        }
    }

    /// The name matching the job registry's `method` column.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fake => "fake",
        }
    }
}

/// Input modality a model is asked to embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Image,
    Multimodal,
}

/// Errors from the generation boundary.
#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("unknown embedding method: {0}")]
    UnknownMethod(String),

    #[error("model {model:?} not allowed for method {method}")]
    ModelNotAllowed { method: &'static str, model: String },

    #[error("empty input batch")]
    EmptyInput,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The embedding service returned a non-2xx status code.
    #[error("embedding service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    /// Generation failed for a backend-specific reason.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// A generation capability: raw inputs plus a model selector in,
/// fixed-width vectors out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Which method this embedder implements.
    fn method(&self) -> EmbedMethod;

    /// Whether `model` is permitted for this embedder and modality.
    fn is_model_allowed(&self, model: &str, input_type: InputType) -> bool;

    /// Generate one vector per input, positionally ordered.
    async fn embed(
        &self,
        model: &str,
        inputs: &[String],
    ) -> Result<EmbeddingBatch, EmbedderError>;
}

/// Registry of available embedders, keyed by method.
pub struct EmbedderRegistry {
    embedders: Vec<Arc<dyn Embedder>>,
}

impl EmbedderRegistry {
    pub fn new(embedders: Vec<Arc<dyn Embedder>>) -> Self {
        Self { embedders }
    }

    /// Build the production registry from environment variables.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `EMBEDDING_SERVICE_URL`    | `http://127.0.0.1:50051` |
    /// | `EMBEDDING_ALLOWED_MODELS` | empty (allow any model)  |
    pub fn from_env() -> Self {
        let base_url = std::env::var("EMBEDDING_SERVICE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:50051".into());

        let allowed_models: Vec<String> = std::env::var("EMBEDDING_ALLOWED_MODELS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self::new(vec![Arc::new(crate::remote::RemoteEmbedder::new(
            base_url,
            allowed_models,
        ))])
    }

    /// Resolve a method name to a method with a registered embedder.
    pub fn validate_method(&self, name: &str) -> Option<EmbedMethod> {
        let method = EmbedMethod::from_name(name)?;
        self.get(method).map(|_| method)
    }

    /// Whether `model` is permitted for `method` and `input_type`.
    pub fn validate_model(&self, method: EmbedMethod, model: &str, input_type: InputType) -> bool {
        self.get(method)
            .map(|e| e.is_model_allowed(model, input_type))
            .unwrap_or(false)
    }

    /// Look up the embedder for a method.
    pub fn get(&self, method: EmbedMethod) -> Option<&dyn Embedder> {
        self.embedders
            .iter()
            .find(|e| e.method() == method)
            .map(|e| e.as_ref())
    }

    /// Embed a single input, validating method and model first.
    ///
    /// Convenience for ad-hoc callers outside the batch worker path.
    pub async fn embed_one(
        &self,
        method_name: &str,
        model: &str,
        input: &str,
    ) -> Result<Vec<f32>, EmbedderError> {
        let method = self
            .validate_method(method_name)
            .ok_or_else(|| EmbedderError::UnknownMethod(method_name.to_string()))?;
        if !self.validate_model(method, model, InputType::Text) {
            return Err(EmbedderError::ModelNotAllowed {
                method: method.name(),
                model: model.to_string(),
            });
        }

        let embedder = self
            .get(method)
            .ok_or_else(|| EmbedderError::UnknownMethod(method_name.to_string()))?;
        let batch = embedder.embed(model, &[input.to_string()]).await?;
        batch
            .validate()
            .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))?;
        if batch.n_vectors != 1 {
            return Err(EmbedderError::MalformedResponse(format!(
                "expected 1 vector, got {}",
                batch.n_vectors
            )));
        }
        Ok(batch.vector(0).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeEmbedder;
    use assert_matches::assert_matches;

    fn registry() -> EmbedderRegistry {
        EmbedderRegistry::new(vec![Arc::new(
            FakeEmbedder::new(4).with_allowed_models(vec!["test-model".into()]),
        )])
    }

    #[test]
    fn method_names_roundtrip() {
        assert_eq!(EmbedMethod::from_name("remote"), Some(EmbedMethod::Remote));
        assert_eq!(EmbedMethod::from_name("fake"), Some(EmbedMethod::Fake));
        assert_eq!(EmbedMethod::from_name("grpc"), None);
        assert_eq!(EmbedMethod::Remote.name(), "remote");
        assert_eq!(EmbedMethod::Fake.name(), "fake");
    }

    #[test]
    fn validate_method_requires_a_registered_embedder() {
        let registry = registry();
        assert_eq!(registry.validate_method("fake"), Some(EmbedMethod::Fake));
        // "remote" is a known name but nothing is registered for it here.
        assert_eq!(registry.validate_method("remote"), None);
        assert_eq!(registry.validate_method("nonsense"), None);
    }

    #[test]
    fn validate_model_consults_the_allow_list() {
        let registry = registry();
        assert!(registry.validate_model(EmbedMethod::Fake, "test-model", InputType::Text));
        assert!(!registry.validate_model(EmbedMethod::Fake, "bogus", InputType::Text));
    }

    #[tokio::test]
    async fn embed_one_returns_a_single_vector() {
        let registry = registry();
        let vector = registry.embed_one("fake", "test-model", "hello").await.unwrap();
        assert_eq!(vector.len(), 4);
    }

    #[tokio::test]
    async fn embed_one_rejects_disallowed_model() {
        let registry = registry();
        let err = registry.embed_one("fake", "bogus", "hello").await.unwrap_err();
        assert_matches!(err, EmbedderError::ModelNotAllowed { .. });
    }

    #[tokio::test]
    async fn embed_one_rejects_unknown_method() {
        let registry = registry();
        let err = registry
            .embed_one("quantum", "test-model", "hello")
            .await
            .unwrap_err();
        assert_matches!(err, EmbedderError::UnknownMethod(_));
    }
}
