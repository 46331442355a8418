//! One-shot ingestion: load the PDFs in a directory, embed their chunks, and upsert them into
//! the configured Pinecone index.
//!
//! The index is created on first use and reused afterwards. Running the command again uploads
//! fresh copies of every chunk.
use anyhow::{Context, Result};
use arogyam::{config, logging, processing::IngestionService};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ingest", about = "Embed domain PDFs into the Pinecone index")]
struct Args {
    /// Directory containing the PDFs to ingest (defaults to `PDF_SOURCE_DIR`).
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    config::init_config();
    logging::init_tracing("ingest");

    let config = config::get_config();
    let dir = args.dir.unwrap_or_else(|| config.pdf_source_dir.clone());

    let service = IngestionService::new().context("failed to initialize ingestion clients")?;
    let outcome = service
        .run(&dir)
        .await
        .with_context(|| format!("ingestion of {} failed", dir.display()))?;

    tracing::info!(
        documents = outcome.documents,
        chunks = outcome.chunks,
        upserted = outcome.upserted,
        "Ingestion complete"
    );
    println!(
        "Successfully stored {} document chunks in Pinecone index '{}'.",
        outcome.upserted, config.pinecone_index_name
    );
    Ok(())
}
