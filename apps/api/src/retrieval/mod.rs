//! In-memory vector index over one document's chunks.
//!
//! The index is built once per upload and read-only afterward. Nearest
//! neighbors are found by brute-force cosine similarity over the chunk
//! embeddings, which is more than enough for a single résumé.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::embedding::{Embedder, EmbeddingError};
use crate::ingest::chunker::Chunk;

/// Number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

struct IndexedChunk {
    id: Uuid,
    text: String,
    embedding: Vec<f32>,
}

/// A retrieval hit: chunk text plus its similarity score for the query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk_id: Uuid,
    pub text: String,
    pub score: f32,
}

/// The embedded chunk set for one uploaded document.
pub struct DocumentIndex {
    document: String,
    chunks: Vec<IndexedChunk>,
    dimensions: usize,
}

impl DocumentIndex {
    /// Embeds every chunk in one batch call and assembles the index.
    pub async fn build(
        document: &str,
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
    ) -> Result<Self, EmbeddingError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(EmbeddingError::ShapeMismatch {
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        for embedding in &embeddings {
            if embedding.len() != dimensions {
                return Err(EmbeddingError::ShapeMismatch {
                    expected: dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let chunks = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: chunk.id,
                text: chunk.text,
                embedding,
            })
            .collect();

        Ok(Self {
            document: document.to_string(),
            chunks,
            dimensions,
        })
    }

    /// Returns the `k` chunks most similar to the query embedding,
    /// best first. `k` is clamped to the chunk count.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(query_embedding, &chunk.embedding), chunk))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            "Retrieved top {} of {} chunks from '{}'",
            k.min(scored.len()),
            scored.len(),
            self.document
        );

        scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| RetrievedChunk {
                chunk_id: chunk.id,
                text: chunk.text.clone(),
                score,
            })
            .collect()
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Shared slot holding the active index, if any.
///
/// Readers take a cheap `Arc` snapshot and keep using it even if an upload
/// swaps the slot mid-turn; `install` replaces the whole index in one store,
/// so no reader ever sees a partially rebuilt index.
#[derive(Clone, Default)]
pub struct IndexSlot {
    inner: Arc<RwLock<Option<Arc<DocumentIndex>>>>,
}

impl IndexSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the active index with a fully built one.
    pub fn install(&self, index: DocumentIndex) {
        let mut slot = self.inner.write().expect("index slot lock poisoned");
        *slot = Some(Arc::new(index));
    }

    /// Snapshot of the active index; `None` until a document is indexed.
    pub fn current(&self) -> Option<Arc<DocumentIndex>> {
        self.inner.read().expect("index slot lock poisoned").clone()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    dot / denominator
}
