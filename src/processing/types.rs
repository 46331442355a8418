//! Core data types and error definitions for the ingestion pipeline.

use crate::{embedding::EmbeddingClientError, pinecone::PineconeError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Provenance of a page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// Path of the PDF the page was read from.
    pub source: String,
    /// Zero-based page index within the source PDF.
    pub page: u32,
}

/// One page of extracted PDF text.
#[derive(Debug, Clone)]
pub struct Document {
    /// Extracted page text.
    pub text: String,
    /// Source file and page.
    pub metadata: DocumentMetadata,
}

/// Bounded span of a document's text, ready for embedding.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// Metadata inherited from the originating page.
    pub metadata: DocumentMetadata,
}

/// Errors produced while turning page text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunking configured an impossible budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap leaves no room for new text in each chunk.
    #[error("chunk overlap {overlap} leaves no room within chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Requested overlap in characters.
        overlap: usize,
        /// Requested chunk size in characters.
        chunk_size: usize,
    },
}

/// Errors raised while reading PDFs from the source directory.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Source directory is missing.
    #[error("Directory {} does not exist", .0.display())]
    NotFound(PathBuf),
    /// No PDFs were found, or none contained extractable text.
    #[error("No PDF text found in {}", .0.display())]
    EmptyResult(PathBuf),
    /// A PDF could not be parsed.
    #[error("Failed to extract text from {}: {message}", .path.display())]
    Pdf {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// Filesystem access failed while scanning or reading.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Loader produced nothing to index.
    #[error("No PDF documents found. Ensure {} has valid PDFs.", .0.display())]
    NoDocuments(PathBuf),
    /// Chunking step failed.
    #[error("Failed to chunk documents: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Pinecone rejected an index or upsert request.
    #[error("Pinecone request failed: {0}")]
    Pinecone(#[from] PineconeError),
    /// Blocking PDF extraction task panicked or was cancelled.
    #[error("PDF loading task failed: {0}")]
    LoaderTask(#[from] tokio::task::JoinError),
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Pages loaded from the source directory.
    pub documents: usize,
    /// Chunks produced from those pages.
    pub chunks: usize,
    /// Vectors acknowledged by Pinecone.
    pub upserted: usize,
}
