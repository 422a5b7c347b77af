mod chat;
mod config;
mod embedding;
mod errors;
mod ingest;
mod llm_client;
mod retrieval;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::HfEmbedder;
use crate::llm_client::GroqClient;
use crate::retrieval::IndexSlot;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting NextStep API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = Arc::new(GroqClient::new(config.groq_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize embedding client
    let embedder = Arc::new(HfEmbedder::new(config.hf_token.clone()));
    info!(
        "Embedding client initialized (model: {})",
        embedding::EMBEDDING_MODEL
    );

    // Build app state: empty index slot and session store until first use
    let state = AppState {
        llm,
        embedder,
        index: IndexSlot::new(),
        sessions: SessionStore::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
