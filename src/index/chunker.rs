//! Deterministic text chunking.
//!
//! Splits a document into fixed-size character windows with a fixed overlap
//! between neighbors. Identical input and configuration always produce
//! byte-identical chunk sequences, which the persisted index relies on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between neighboring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 50,
        }
    }
}

/// An ordered span of source text, the retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text content.
    pub text: String,
    /// Source identifier (URL, document name).
    pub source: String,
    /// Character offset in the original document.
    pub start_offset: usize,
    /// Chunk index within the source.
    pub chunk_index: usize,
}

/// Split one document into overlapping chunks.
///
/// The window advances by `chunk_size - chunk_overlap`, so every neighbor
/// pair shares `chunk_overlap` characters whenever the document is longer
/// than one chunk. Whitespace-only documents yield no chunks.
pub fn split_document(text: &str, source: &str, config: &ChunkConfig) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();
    let step = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chunk_index = 0;

    while start < total_chars {
        let end = (start + config.chunk_size).min(total_chars);
        let chunk_text: String = chars[start..end].iter().collect();

        chunks.push(Chunk {
            text: chunk_text,
            source: source.to_string(),
            start_offset: start,
            chunk_index,
        });

        if end == total_chars {
            break;
        }
        start += step;
        chunk_index += 1;
    }

    chunks
}
