//! Fixed-budget chunking of extracted document text.
//!
//! Chunks are measured in characters, not tokens. Each document is split independently:
//!
//! - Base segmentation uses `semchunk-rs` with a character counter, so boundaries prefer
//!   paragraph, line, and word breaks over mid-word cuts.
//! - Every chunk after the first starts with exactly the last [`CHUNK_OVERLAP`] characters of the
//!   chunk before it, keeping spans around a boundary retrievable from both sides.
//! - The base budget reserves room for the overlap and one joining space, so no chunk exceeds
//!   [`CHUNK_SIZE`] characters.

use semchunk_rs::Chunker;

use super::types::{Chunk, ChunkingError, Document};

/// Maximum characters per chunk.
pub const CHUNK_SIZE: usize = 500;
/// Characters shared between consecutive chunks of the same document.
pub const CHUNK_OVERLAP: usize = 20;

/// Split every document into overlapping chunks, preserving document order and boundaries.
///
/// Each chunk inherits the metadata of the page it was cut from.
pub fn split_documents(documents: &[Document]) -> Result<Vec<Chunk>, ChunkingError> {
    let mut chunks = Vec::new();
    for document in documents {
        for text in chunk_text(&document.text, CHUNK_SIZE, CHUNK_OVERLAP)? {
            chunks.push(Chunk {
                text,
                metadata: document.metadata.clone(),
            });
        }
    }
    tracing::debug!(
        documents = documents.len(),
        chunks = chunks.len(),
        chunk_size = CHUNK_SIZE,
        overlap = CHUNK_OVERLAP,
        "Split documents into chunks"
    );
    Ok(chunks)
}

/// Chunk a single text into windows of at most `chunk_size` characters.
///
/// Returns an empty vector when the input is all whitespace.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap > 0 && overlap + 1 >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            chunk_size,
        });
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let budget = if overlap == 0 {
        chunk_size
    } else {
        chunk_size - overlap - 1
    };
    let base = base_segments(text, budget);
    Ok(apply_overlap(base, overlap))
}

fn char_count(segment: &str) -> usize {
    segment.chars().count()
}

fn base_segments(text: &str, budget: usize) -> Vec<String> {
    let chunker = Chunker::new(budget, Box::new(char_count));
    chunker
        .chunk(text)
        .into_iter()
        .filter(|segment| !segment.trim().is_empty())
        .flat_map(|segment| hard_split(segment, budget))
        .collect()
}

/// Cut a segment into consecutive character windows when it still exceeds `budget`.
fn hard_split(segment: String, budget: usize) -> Vec<String> {
    if char_count(&segment) <= budget {
        return vec![segment];
    }
    let chars: Vec<char> = segment.chars().collect();
    chars
        .chunks(budget)
        .map(|window| window.iter().collect::<String>())
        .filter(|window| !window.trim().is_empty())
        .collect()
}

fn apply_overlap(segments: Vec<String>, overlap: usize) -> Vec<String> {
    if overlap == 0 {
        return segments;
    }

    let mut chunks: Vec<String> = Vec::with_capacity(segments.len());
    for segment in segments {
        let chunk = match chunks.last() {
            Some(previous) => join_with_tail(tail_chars(previous, overlap), &segment),
            None => segment,
        };
        chunks.push(chunk);
    }
    chunks
}

fn join_with_tail(tail: &str, segment: &str) -> String {
    let mut combined = String::with_capacity(tail.len() + segment.len() + 1);
    combined.push_str(tail);
    if !ends_with_whitespace(tail) && !starts_with_whitespace(segment) {
        combined.push(' ');
    }
    combined.push_str(segment);
    combined
}

/// Last `count` characters of `text` (all of it when shorter).
fn tail_chars(text: &str, count: usize) -> &str {
    let skip = char_count(text).saturating_sub(count);
    match text.char_indices().nth(skip) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

fn starts_with_whitespace(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_whitespace)
}

fn ends_with_whitespace(text: &str) -> bool {
    text.chars().next_back().is_some_and(char::is_whitespace)
}
