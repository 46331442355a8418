//! PDF loading for the ingestion pipeline.
//!
//! Scans a single directory (non-recursive) for `*.pdf` files and extracts one [`Document`] per
//! page that carries text.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::types::{Document, DocumentMetadata, LoaderError};

/// Load every PDF directly inside `dir`, logging failures and returning an empty vector instead
/// of an error.
///
/// Callers must treat an empty result as "nothing to ingest".
pub fn pdf_loader(dir: &Path) -> Vec<Document> {
    match load_pdf_directory(dir) {
        Ok(documents) => documents,
        Err(error) => {
            tracing::error!(dir = %dir.display(), error = %error, "Error loading PDFs");
            Vec::new()
        }
    }
}

/// Load every PDF directly inside `dir`, one document per non-blank page.
///
/// Files are visited in file-name order so repeated runs produce identical output.
pub fn load_pdf_directory(dir: &Path) -> Result<Vec<Document>, LoaderError> {
    if !dir.is_dir() {
        return Err(LoaderError::NotFound(dir.to_path_buf()));
    }

    let files = list_pdf_files(dir)?;
    tracing::debug!(dir = %dir.display(), files = files.len(), "Found PDF files");

    let mut documents = Vec::new();
    for path in &files {
        let pages = extract_pages(path)?;
        let source = path.display().to_string();
        let before = documents.len();
        for (page, text) in pages.into_iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            documents.push(Document {
                text,
                metadata: DocumentMetadata {
                    source: source.clone(),
                    page: page as u32,
                },
            });
        }
        tracing::debug!(file = %source, pages = documents.len() - before, "Extracted PDF text");
    }

    if documents.is_empty() {
        return Err(LoaderError::EmptyResult(dir.to_path_buf()));
    }

    tracing::info!(
        dir = %dir.display(),
        files = files.len(),
        pages = documents.len(),
        "Loaded PDF documents"
    );
    Ok(documents)
}

fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|error| LoaderError::Io {
            path: dir.to_path_buf(),
            source: error.into(),
        })?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn extract_pages(path: &Path) -> Result<Vec<String>, LoaderError> {
    let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|error| LoaderError::Pdf {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}
