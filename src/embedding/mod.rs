//! Sentence-embedding provider used for both chunk indexing and query-time search.
//!
//! The same client (and therefore the same model) embeds ingested chunks and user questions.
//! Switching `EMBEDDING_MODEL` after ingestion invalidates the stored vectors; only the
//! dimension is checked here.

use crate::config::{Config, get_config};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use thiserror::Error;

/// Inputs sent per feature-extraction request.
const EMBEDDING_BATCH_SIZE: usize = 32;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// Provider could not be reached.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned vectors of an unexpected length.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension configured for the vector index.
        expected: usize,
        /// Dimension produced by the provider.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied text, in input order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;

    /// Dimension of the vectors this client produces.
    fn dimension(&self) -> usize;
}

/// Client for the HuggingFace feature-extraction pipeline.
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    model: String,
    token: String,
    dimension: usize,
}

impl HuggingFaceClient {
    /// Build a client from explicit configuration.
    pub fn from_config(config: &Config) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder()
            .user_agent("arogyam/embeddings")
            .build()
            .map_err(|error| EmbeddingClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: config.embedding_url.clone(),
            model: config.embedding_model.clone(),
            token: config.hf_token.clone(),
            dimension: config.embedding_dimension,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&json!({
                "inputs": batch,
                "options": { "wait_for_model": true }
            }))
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::ProviderUnavailable(format!(
                    "failed to reach embedding endpoint {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EmbeddingClientError::ProviderUnavailable(format!(
                "embedding endpoint rejected the HF token ({status})"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let vectors: Vec<Vec<f32>> = response.json().await.map_err(|error| {
            EmbeddingClientError::GenerationFailed(format!(
                "failed to decode embedding response: {error}"
            ))
        })?;

        if vectors.len() != batch.len() {
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "expected {} vectors, received {}",
                batch.len(),
                vectors.len()
            )));
        }
        if let Some(vector) = vectors.iter().find(|vector| vector.len() != self.dimension) {
            return Err(EmbeddingClientError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingClient for HuggingFaceClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        tracing::debug!(
            model = %self.model,
            dimension = self.dimension,
            inputs = texts.len(),
            "Generating embeddings"
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch).await?);
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client() -> Result<Box<dyn EmbeddingClient + Send + Sync>, EmbeddingClientError>
{
    Ok(Box::new(HuggingFaceClient::from_config(get_config())?))
}
