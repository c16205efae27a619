//! Route definitions for the tutor relay.
//!
//! - `GET /` liveness text
//! - `GET /health` service status with live session count
//! - `POST /chat` one conversational turn

use crate::error::RelayError;
use crate::relay::{ChatInput, ChatRelay};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ROOT_TEXT: &str = "HCM Tutor Bot running!";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ChatRelay>,
}

impl AppState {
    pub fn new(relay: ChatRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Chat request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseBody {
    pub reply: String,
    pub session_id: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub sessions: usize,
}

/// Build the relay routes. Middleware is layered on in [`crate::build_router`].
pub fn relay_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

async fn root_handler() -> &'static str {
    ROOT_TEXT
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "tutor-relay".into(),
        sessions: state.relay.store().len().await,
    })
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Json<ChatResponseBody>, RelayError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected chat body");
        RelayError::InvalidRequest(rejection.body_text())
    })?;

    let outcome = state
        .relay
        .handle(ChatInput {
            message: body.message,
            session_id: body.session_id,
        })
        .await?;

    Ok(Json(ChatResponseBody {
        reply: outcome.reply,
        session_id: outcome.session_id,
    }))
}
