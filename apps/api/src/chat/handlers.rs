use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::prompts::EMPTY_STATE_MESSAGE;
use crate::chat::run_turn;
use crate::errors::AppError;
use crate::retrieval::RetrievedChunk;
use crate::session::{resolve_session_id, Turn};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
    /// False when the answer is the informational empty-state message
    /// rather than a retrieval-grounded reply.
    pub grounded: bool,
}

/// POST /api/v1/chat
///
/// With no document indexed, the retrieval and answering components are never
/// invoked and the transcript is not touched; the caller gets the empty-state
/// message and can upload a resume first.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    let session_id = resolve_session_id(req.session_id);

    let Some(index) = state.index.current() else {
        return Ok(Json(ChatResponse {
            session_id,
            answer: EMPTY_STATE_MESSAGE.to_string(),
            sources: Vec::new(),
            grounded: false,
        }));
    };

    let outcome = run_turn(
        state.llm.as_ref(),
        state.embedder.as_ref(),
        &index,
        &state.sessions,
        &session_id,
        question,
    )
    .await?;

    Ok(Json(ChatResponse {
        session_id,
        answer: outcome.answer,
        sources: outcome.sources,
        grounded: true,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

/// GET /api/v1/chat/history?session_id=...
/// Append-only transcript snapshot in chronological order.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Json<HistoryResponse> {
    let session_id = resolve_session_id(params.session_id);
    let turns = state.sessions.history(&session_id);
    Json(HistoryResponse { session_id, turns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::embedding::{Embedder, EmbeddingError};
    use crate::llm_client::{ChatMessage, ChatModel, LlmError};
    use crate::retrieval::IndexSlot;
    use crate::session::{SessionStore, DEFAULT_SESSION_ID};
    use crate::state::AppState;

    struct PanickingModel;

    #[async_trait]
    impl ChatModel for PanickingModel {
        async fn complete(
            &self,
            _system: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            panic!("model must not be called without an indexed document")
        }
    }

    struct PanickingEmbedder;

    #[async_trait]
    impl Embedder for PanickingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            panic!("embedder must not be called without an indexed document")
        }
    }

    fn state_without_index() -> AppState {
        AppState {
            llm: Arc::new(PanickingModel),
            embedder: Arc::new(PanickingEmbedder),
            index: IndexSlot::new(),
            sessions: SessionStore::new(),
        }
    }

    #[tokio::test]
    async fn test_chat_without_index_yields_empty_state_and_records_nothing() {
        let state = state_without_index();

        let Json(response) = handle_chat(
            State(state.clone()),
            Json(ChatRequest {
                session_id: None,
                question: "What skills do I need for role X?".to_string(),
            }),
        )
        .await
        .unwrap();

        // Panicking collaborators prove neither retrieval nor answering ran.
        assert_eq!(response.answer, EMPTY_STATE_MESSAGE);
        assert!(!response.grounded);
        assert!(response.sources.is_empty());
        assert_eq!(response.session_id, DEFAULT_SESSION_ID);
        assert!(state.sessions.history(DEFAULT_SESSION_ID).is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_is_a_validation_error() {
        let result = handle_chat(
            State(state_without_index()),
            Json(ChatRequest {
                session_id: Some("s1".to_string()),
                question: "   ".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_history_endpoint_defaults_the_session_id() {
        let Json(response) = handle_history(
            State(state_without_index()),
            Query(SessionQuery { session_id: None }),
        )
        .await;

        assert_eq!(response.session_id, DEFAULT_SESSION_ID);
        assert!(response.turns.is_empty());
    }
}
