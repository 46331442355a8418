//! Ingestion service coordinating PDF loading, chunking, embedding, and Pinecone writes.

use crate::{
    config::{Config, get_config},
    embedding::{EmbeddingClient, HuggingFaceClient},
    pinecone::{PineconeService, VectorRecord},
    processing::{
        chunking::split_documents,
        loader::pdf_loader,
        types::{Chunk, IngestError, IngestOutcome},
    },
};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

const READY_POLL_ATTEMPTS: usize = 30;
const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Runs the offline ingestion pipeline against one Pinecone index.
///
/// Construct once per run. Repeated runs against the same directory upsert fresh copies of every
/// chunk; nothing de-duplicates them.
pub struct IngestionService {
    embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
    pinecone: PineconeService,
    index_name: String,
    ready_interval: Duration,
}

impl IngestionService {
    /// Build the service from the global configuration.
    pub fn new() -> Result<Self, IngestError> {
        Self::from_config(get_config())
    }

    /// Build the service from explicit configuration.
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        let embedding_client = HuggingFaceClient::from_config(config)?;
        let pinecone = PineconeService::new(config)?;
        Ok(Self::from_parts(
            Box::new(embedding_client),
            pinecone,
            config.pinecone_index_name.clone(),
        ))
    }

    /// Assemble a service from already-built components.
    pub fn from_parts(
        embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
        pinecone: PineconeService,
        index_name: String,
    ) -> Self {
        Self {
            embedding_client,
            pinecone,
            index_name,
            ready_interval: READY_POLL_INTERVAL,
        }
    }

    /// Override the delay between index readiness probes.
    pub fn with_ready_interval(mut self, interval: Duration) -> Self {
        self.ready_interval = interval;
        self
    }

    /// Ensure the index exists, then load, chunk, embed, and upsert every PDF in `dir`.
    pub async fn run(&self, dir: &Path) -> Result<IngestOutcome, IngestError> {
        let dimension = self.embedding_client.dimension();
        self.pinecone
            .create_index_if_not_exists(&self.index_name, dimension)
            .await?;
        let host = self
            .pinecone
            .wait_until_ready(&self.index_name, READY_POLL_ATTEMPTS, self.ready_interval)
            .await?;

        let source_dir = dir.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || pdf_loader(&source_dir)).await?;
        if documents.is_empty() {
            return Err(IngestError::NoDocuments(dir.to_path_buf()));
        }

        let chunks = split_documents(&documents)?;
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Prepared chunks for embedding"
        );
        if chunks.is_empty() {
            return Ok(IngestOutcome {
                documents: documents.len(),
                chunks: 0,
                upserted: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedding_client.generate_embeddings(texts).await?;
        debug_assert_eq!(chunks.len(), embeddings.len());

        let chunk_count = chunks.len();
        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, values)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: chunk_metadata(chunk),
            })
            .collect();

        let upserted = self.pinecone.upsert(&host, records).await?;
        tracing::info!(
            index = %self.index_name,
            chunks = chunk_count,
            upserted,
            "Stored document chunks"
        );

        Ok(IngestOutcome {
            documents: documents.len(),
            chunks: chunk_count,
            upserted,
        })
    }
}

/// Metadata stored with each vector: the chunk text plus its provenance.
fn chunk_metadata(chunk: Chunk) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("text".into(), Value::String(chunk.text));
    metadata.insert("source".into(), Value::String(chunk.metadata.source));
    metadata.insert("page".into(), Value::from(chunk.metadata.page));
    metadata
}
