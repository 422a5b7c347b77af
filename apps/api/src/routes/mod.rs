pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat_handlers;
use crate::ingest::handlers as ingest_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resume", post(ingest_handlers::handle_upload))
        .route("/api/v1/chat", post(chat_handlers::handle_chat))
        .route("/api/v1/chat/history", get(chat_handlers::handle_history))
        .with_state(state)
}
