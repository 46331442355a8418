//! Retrieval-augmented generation chain: embed the question, fetch the nearest chunks, fill the
//! prompt, and ask the chat model.
//!
//! The chain is built once at startup and shared read-only across requests. There is no retry,
//! caching, or streaming; each call performs one embedding request, one vector query, and one
//! generation request in sequence.

pub mod prompt;

use crate::{
    config::{Config, get_config},
    embedding::{EmbeddingClient, EmbeddingClientError, HuggingFaceClient},
    llm::{ChatModel, GeminiClient, LlmError},
    pinecone::{PineconeError, PineconeService},
};
use async_trait::async_trait;
use thiserror::Error;

pub use prompt::PromptTemplate;

/// Number of chunks retrieved per question.
pub const TOP_K: usize = 5;

/// Errors raised while answering a question.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Embedding provider failed to embed the question.
    #[error("Failed to embed question: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Embedding provider returned no vector for the question.
    #[error("Embedding provider returned no vector for the question")]
    EmptyEmbedding,
    /// Vector search failed.
    #[error("Vector search failed: {0}")]
    VectorStore(#[from] PineconeError),
    /// Chat model failed to produce an answer.
    #[error("Failed to generate answer: {0}")]
    Llm(#[from] LlmError),
}

/// Abstraction over the answering pipeline used by the HTTP surface.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Answer `message` in `language`, grounded on retrieved context.
    async fn answer(&self, message: &str, language: &str) -> Result<String, ChainError>;
}

/// Composition of retriever, prompt template, and chat model.
pub struct RagChain {
    embedder: Box<dyn EmbeddingClient + Send + Sync>,
    vector_store: PineconeService,
    index_host: String,
    llm: Box<dyn ChatModel>,
    template: PromptTemplate,
    top_k: usize,
}

impl RagChain {
    /// Build the chain from the global configuration, resolving the index host once.
    pub async fn new() -> Result<Self, ChainError> {
        Self::from_config(get_config()).await
    }

    /// Build the chain from explicit configuration.
    pub async fn from_config(config: &Config) -> Result<Self, ChainError> {
        tracing::info!("Initializing embedding client");
        let embedder = Box::new(HuggingFaceClient::from_config(config)?);
        let vector_store = PineconeService::new(config)?;
        let index_host = vector_store
            .resolve_host(&config.pinecone_index_name)
            .await?;
        tracing::info!(
            index = %config.pinecone_index_name,
            host = %index_host,
            "Connected to existing Pinecone index"
        );
        let llm = Box::new(GeminiClient::new(config)?);

        Ok(Self::from_parts(
            embedder,
            vector_store,
            index_host,
            llm,
            PromptTemplate::new(config.system_prompt.clone()),
        ))
    }

    /// Assemble a chain from already-built components.
    pub fn from_parts(
        embedder: Box<dyn EmbeddingClient + Send + Sync>,
        vector_store: PineconeService,
        index_host: String,
        llm: Box<dyn ChatModel>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            index_host,
            llm,
            template,
            top_k: TOP_K,
        }
    }

    /// Retrieve the texts of the `top_k` chunks most similar to `query`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>, ChainError> {
        let vector = self
            .embedder
            .generate_embeddings(vec![query.to_string()])
            .await?
            .pop()
            .ok_or(ChainError::EmptyEmbedding)?;

        let matches = self
            .vector_store
            .query(&self.index_host, vector, self.top_k)
            .await?;
        Ok(matches
            .iter()
            .filter_map(|hit| hit.text().map(str::to_string))
            .collect())
    }
}

#[async_trait]
impl ChatApi for RagChain {
    async fn answer(&self, message: &str, language: &str) -> Result<String, ChainError> {
        let context = self.retrieve(message).await?;
        tracing::debug!(chunks = context.len(), language, "Retrieved context");
        let prompt = self.template.render(&context[..], language, message);
        let answer = self.llm.generate(prompt).await?;
        Ok(answer)
    }
}
