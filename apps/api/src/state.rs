use std::sync::Arc;

use crate::embedding::Embedder;
use crate::llm_client::ChatModel;
use crate::retrieval::IndexSlot;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion model behind a trait seam so tests can script it.
    pub llm: Arc<dyn ChatModel>,
    /// Embedding service, same seam.
    pub embedder: Arc<dyn Embedder>,
    /// Active document index; empty until the first successful upload.
    pub index: IndexSlot,
    /// Process-wide per-session transcripts.
    pub sessions: SessionStore,
}
