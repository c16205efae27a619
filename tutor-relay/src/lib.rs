//! Tutor Relay - session-scoped chat in front of the Gemini API.
//!
//! ```text
//! Client ─POST /chat─▶ Relay ─▶ SessionStore (per-session lock)
//!                        │
//!                        └──▶ Provider (Gemini) ──fail──▶ keyword fallback
//! ```
//!
//! A background sweep evicts sessions that have been idle too long.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod error;
pub mod provider;
pub mod relay;
pub mod replies;
pub mod routes;
pub mod session;

pub use error::RelayError;
pub use provider::{ChatRequest, ChatResponse, GeminiProvider, Provider, ProviderError};
pub use relay::{ChatInput, ChatOutcome, ChatRelay, RelaySettings, ReplySource};
pub use routes::AppState;
pub use session::{InMemorySessionStore, Session, SessionStore, Turn, TurnRole};

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tutor_common::config::Config;

/// Build application state with the Gemini provider and an in-memory store.
///
/// Fails when no API key is configured.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let api_key = config.require_api_key()?;
    let provider = Arc::new(GeminiProvider::new(api_key, &config.llm));
    let store = Arc::new(InMemorySessionStore::new());

    Ok(AppState::new(ChatRelay::new(
        store,
        provider,
        RelaySettings::from_config(config),
    )))
}

/// Build the relay router with CORS and a request body limit.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::relay_routes(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(cors)
}

/// Periodically evict sessions idle for longer than `max_idle`.
pub fn spawn_idle_sweep(
    store: Arc<dyn SessionStore>,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    let max_idle_secs = i64::try_from(max_idle.as_secs()).unwrap_or(i64::MAX);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle(max_idle_secs).await;
            if evicted > 0 {
                let remaining = store.len().await;
                tracing::info!(evicted, remaining, "Evicted idle sessions");
            }
        }
    })
}

/// Start the relay server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let state = build_state(config)?;

    let sweep = spawn_idle_sweep(
        Arc::clone(state.relay.store()),
        Duration::from_secs(config.relay.sweep_interval_secs),
        Duration::from_secs(config.relay.session_idle_secs),
    );

    let router = build_router(state, config.relay.max_body_bytes);
    let addr = config.listen_address();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        model = %config.llm.model,
        max_turns = config.relay.max_turns,
        "Starting tutor relay"
    );

    let result = axum::serve(listener, router).await;
    sweep.abort();

    result?;
    Ok(())
}
