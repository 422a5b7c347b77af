//! Sliding-window text chunking for retrieval indexing.
//!
//! The splitter is a fixed-size window over characters with a fixed overlap
//! between neighboring chunks. No randomness, no content-dependent break
//! points: identical input and configuration always produce identical chunk
//! boundaries, so retrieval results are reproducible across runs.

use uuid::Uuid;

/// Maximum characters per chunk.
pub const MAX_CHUNK_SIZE: usize = 5000;

/// Characters shared between a chunk and its successor.
pub const CHUNK_OVERLAP: usize = 500;

/// A bounded slice of the source document, the unit of retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: Uuid,
    pub index: usize,
    pub text: String,
}

/// Chunks a document given as ordered page texts.
///
/// The retrieval unit is the whole document, not the page: pages are joined
/// with a blank line before splitting so chunks may span page boundaries.
pub fn chunk_document(pages: &[String], max_size: usize, overlap: usize) -> Vec<Chunk> {
    let text = pages.join("\n\n");
    split_text(text.trim(), max_size, overlap)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            id: Uuid::new_v4(),
            index,
            text,
        })
        .collect()
}

/// Splits text into overlapping windows of at most `max_size` characters.
///
/// Every non-final chunk is exactly `max_size` characters and shares its
/// trailing `overlap` characters with the start of its successor. Boundaries
/// fall on `char` boundaries, never inside a UTF-8 sequence. Empty input
/// yields no chunks; no produced chunk is ever empty.
pub fn split_text(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || max_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the text.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let char_count = boundaries.len() - 1;

    if char_count <= max_size {
        return vec![text.to_string()];
    }

    // A degenerate overlap would stall the window; fall back to disjoint chunks.
    let step = if overlap < max_size {
        max_size - overlap
    } else {
        max_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_count {
        let end = (start + max_size).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }
    chunks
}
