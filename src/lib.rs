#![deny(missing_docs)]

//! Core library for the Arogyam retrieval-augmented chat backend.

/// HTTP routing and chat handler.
pub mod api;
/// Retrieval-augmented generation chain and prompt template.
pub mod chain;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and the HuggingFace adapter.
pub mod embedding;
/// Chat-model abstraction and the Gemini adapter.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Pinecone vector store integration.
pub mod pinecone;
/// PDF ingestion pipeline.
pub mod processing;

#[cfg(test)]
#[path = "../tests/support/mod.rs"]
pub(crate) mod test_pdf;
