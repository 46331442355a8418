//! Pinecone vector store integration.

pub mod client;
pub mod types;

pub use client::PineconeService;
pub use types::{IndexDescription, PineconeError, ScoredMatch, VectorRecord};
