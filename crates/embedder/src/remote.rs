//! HTTP client for the remote embedding service.
//!
//! Wraps the service's batch endpoint using [`reqwest`]. The service
//! accepts a model name plus a batch of texts and returns one vector
//! per input, positionally ordered.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::batch::EmbeddingBatch;
use crate::registry::{EmbedMethod, Embedder, EmbedderError, InputType};

/// Request timeout for a single generation call. Generation is the
/// only step of a job cycle that leaves the process, so this bound is
/// what keeps a cycle from suspending indefinitely. Applied per
/// request, so it holds for caller-supplied clients too.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Request body for `POST /v1/embed_batch`.
#[derive(Debug, Serialize)]
pub struct EmbedBatchRequest<'a> {
    pub model: &'a str,
    pub inputs: &'a [String],
    pub normalize: bool,
    pub truncate: bool,
}

/// Response body: one vector per input, in input order.
#[derive(Debug, Deserialize)]
pub struct EmbedBatchResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by a remote HTTP embedding service.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    base_url: String,
    /// Permitted model names; empty means any model is allowed.
    allowed_models: Vec<String>,
}

impl RemoteEmbedder {
    /// Create a client for the service at `base_url`,
    /// e.g. `http://127.0.0.1:50051`.
    pub fn new(base_url: String, allowed_models: Vec<String>) -> Self {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build HTTP client, using default");
                reqwest::Client::new()
            }
        };
        Self {
            client,
            base_url,
            allowed_models,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        allowed_models: Vec<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            allowed_models,
        }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn method(&self) -> EmbedMethod {
        EmbedMethod::Remote
    }

    fn is_model_allowed(&self, model: &str, input_type: InputType) -> bool {
        // The remote service embeds text only.
        if input_type != InputType::Text {
            return false;
        }
        self.allowed_models.is_empty() || self.allowed_models.iter().any(|m| m == model)
    }

    async fn embed(
        &self,
        model: &str,
        inputs: &[String],
    ) -> Result<EmbeddingBatch, EmbedderError> {
        if inputs.is_empty() {
            return Err(EmbedderError::EmptyInput);
        }

        let request = EmbedBatchRequest {
            model,
            inputs,
            normalize: true,
            truncate: true,
        };
        tracing::debug!(model, inputs = inputs.len(), "Requesting embedding batch");

        let response = self
            .client
            .post(format!("{}/v1/embed_batch", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model,
                "Embedding service returned an error"
            );
            return Err(EmbedderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedBatchResponse = response.json().await?;
        EmbeddingBatch::from_rows(parsed.embeddings)
            .map_err(|e| EmbedderError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_expected_shape() {
        let inputs = vec!["hello".to_string(), "world".to_string()];
        let request = EmbedBatchRequest {
            model: "bge-small",
            inputs: &inputs,
            normalize: true,
            truncate: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "bge-small");
        assert_eq!(json["inputs"][1], "world");
        assert_eq!(json["normalize"], true);
        assert_eq!(json["truncate"], true);
    }

    #[test]
    fn response_parses_embedding_rows() {
        let parsed: EmbedBatchResponse =
            serde_json::from_str(r#"{"embeddings": [[0.1, 0.2], [0.3, 0.4]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[0], vec![0.1, 0.2]);
    }

    #[test]
    fn empty_allow_list_permits_any_text_model() {
        let embedder = RemoteEmbedder::new("http://localhost:1".into(), vec![]);
        assert!(embedder.is_model_allowed("anything", InputType::Text));
        assert!(!embedder.is_model_allowed("anything", InputType::Image));
    }

    #[test]
    fn allow_list_is_exact_match() {
        let embedder = RemoteEmbedder::new(
            "http://localhost:1".into(),
            vec!["bge-small".into(), "bge-large".into()],
        );
        assert!(embedder.is_model_allowed("bge-small", InputType::Text));
        assert!(!embedder.is_model_allowed("bge", InputType::Text));
        assert!(!embedder.is_model_allowed("BGE-SMALL", InputType::Text));
    }
}
