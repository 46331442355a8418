//! Document ingestion pipeline: PDF loading, chunking, embedding, and Pinecone writes.

pub mod chunking;
pub mod loader;
mod service;
pub mod types;

pub use chunking::{CHUNK_OVERLAP, CHUNK_SIZE, chunk_text, split_documents};
pub use loader::{load_pdf_directory, pdf_loader};
pub use service::IngestionService;
pub use types::{
    Chunk, ChunkingError, Document, DocumentMetadata, IngestError, IngestOutcome, LoaderError,
};
