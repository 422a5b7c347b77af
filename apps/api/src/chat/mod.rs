//! Conversational retrieval pipeline.
//!
//! Flow per turn: history snapshot → reformulate question → embed → top-k
//! retrieve → answer with context → append (user, assistant) pair.
//!
//! The pipeline is plain function composition over `Result`: any failed
//! external call fails the whole turn before the transcript is touched, so a
//! failed attempt records nothing and the same input can simply be retried.

pub mod handlers;
pub mod prompts;

use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, ChatModel, LlmError};
use crate::retrieval::{DocumentIndex, RetrievedChunk, DEFAULT_TOP_K};
use crate::session::{Role, SessionStore, Turn};

use prompts::{MENTOR_SYSTEM_TEMPLATE, REFORMULATE_SYSTEM};

/// Result of one successful turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Runs one full conversational turn against an indexed document.
///
/// Callers must route to the empty-state message instead when no index is
/// installed; this function assumes retrieval is possible.
pub async fn run_turn(
    llm: &dyn ChatModel,
    embedder: &dyn Embedder,
    index: &DocumentIndex,
    sessions: &SessionStore,
    session_id: &str,
    question: &str,
) -> Result<TurnOutcome, AppError> {
    let history = sessions.history(session_id);

    let standalone = reformulate_question(llm, &history, question)
        .await
        .map_err(|e| AppError::Llm(format!("Question reformulation failed: {e}")))?;
    if standalone != question {
        debug!("Reformulated {question:?} into {standalone:?}");
    }

    let query_embedding = embedder
        .embed_query(&standalone)
        .await
        .map_err(|e| AppError::Embedding(format!("Query embedding failed: {e}")))?;
    let sources = index.search(&query_embedding, DEFAULT_TOP_K);

    let answer = answer_with_context(llm, &history, &standalone, &sources)
        .await
        .map_err(|e| AppError::Llm(format!("Answer generation failed: {e}")))?;

    // Only now, with the whole turn succeeded, does the transcript change.
    sessions.append_exchange(session_id, question, &answer);

    Ok(TurnOutcome { answer, sources })
}

/// Rewrites a question so it can be understood without the chat history.
///
/// With no history there is nothing to decouple from: the raw question is
/// already standalone and is returned unchanged without an LLM call.
pub async fn reformulate_question(
    llm: &dyn ChatModel,
    history: &[Turn],
    question: &str,
) -> Result<String, LlmError> {
    if history.is_empty() {
        return Ok(question.to_string());
    }

    let mut messages = turns_to_messages(history);
    messages.push(ChatMessage::user(question));

    let standalone = llm.complete(REFORMULATE_SYSTEM, &messages).await?;
    Ok(standalone.trim().to_string())
}

/// Asks the mentor persona to answer the standalone question from the
/// retrieved context and the conversation so far. The answer is grounded in
/// instruction + context + history only; no other knowledge source is wired
/// into the request.
pub async fn answer_with_context(
    llm: &dyn ChatModel,
    history: &[Turn],
    standalone_question: &str,
    sources: &[RetrievedChunk],
) -> Result<String, LlmError> {
    let context = sources
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let system = MENTOR_SYSTEM_TEMPLATE.replace("{context}", &context);

    let mut messages = turns_to_messages(history);
    messages.push(ChatMessage::user(standalone_question));

    llm.complete(&system, &messages).await
}

fn turns_to_messages(history: &[Turn]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|turn| match turn.role {
            Role::User => ChatMessage::user(turn.text.clone()),
            Role::Assistant => ChatMessage::assistant(turn.text.clone()),
        })
        .collect()
}
