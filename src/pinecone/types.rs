//! Shared types used by the Pinecone client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Pinecone.
#[derive(Debug, Error)]
pub enum PineconeError {
    /// Controller or data-plane URL failed to parse.
    #[error("Invalid Pinecone URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Pinecone responded with an unexpected status code.
    #[error("Unexpected Pinecone response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Pinecone.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Index description did not include a data-plane host.
    #[error("Index '{0}' has no data-plane host yet")]
    MissingHost(String),
    /// Index did not report ready within the polling budget.
    #[error("Index '{0}' did not become ready")]
    NotReady(String),
    /// Existing index was created with a different vector dimension.
    #[error("Index '{index}' has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        /// Index name.
        index: String,
        /// Dimension produced by the embedding model.
        expected: usize,
        /// Dimension reported by Pinecone.
        actual: usize,
    },
}

/// Vector and payload prepared for upsert.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    /// Opaque identifier of the entry.
    pub id: String,
    /// Embedding values.
    pub values: Vec<f32>,
    /// Chunk text and provenance stored alongside the vector.
    pub metadata: Map<String, Value>,
}

/// Match returned by a similarity query.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredMatch {
    /// Identifier of the stored entry.
    pub id: String,
    /// Cosine similarity reported by Pinecone.
    #[serde(default)]
    pub score: f32,
    /// Stored metadata, when requested.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl ScoredMatch {
    /// Chunk text stored under the `text` metadata key.
    pub fn text(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get("text"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Control-plane description of an index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    /// Index name.
    pub name: String,
    /// Data-plane host (usually without scheme).
    #[serde(default)]
    pub host: Option<String>,
    /// Configured vector dimension.
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Provisioning status.
    #[serde(default)]
    pub status: Option<IndexStatus>,
}

impl IndexDescription {
    /// Whether the index accepts data-plane traffic.
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|status| status.ready)
    }
}

/// Provisioning status of an index.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexStatus {
    /// True once the index can serve requests.
    #[serde(default)]
    pub ready: bool,
}

#[derive(Deserialize)]
pub(crate) struct ListIndexesResponse {
    #[serde(default)]
    pub(crate) indexes: Vec<IndexDescription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertResponse {
    #[serde(default)]
    pub(crate) upserted_count: usize,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Vec<ScoredMatch>,
}
