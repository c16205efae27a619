//! Session-scoped conversation relay.
//!
//! ```text
//! message ─▶ validate ─▶ greeting? ──yes──▶ canned welcome (no session touched)
//!                            │no
//!                            ▼
//!            get-or-create session (primed) ─▶ lock ─▶ append user turn
//!                            ▼
//!            provider.chat(whole session) ──fail/timeout──▶ keyword fallback
//!                            ▼
//!            append assistant turn ─▶ enforce ceiling ─▶ touch ─▶ reply
//! ```

use crate::error::RelayError;
use crate::provider::{ChatRequest, Message, Provider, ProviderError};
use crate::replies::{self, PRIMING_INSTRUCTION};
use crate::session::{SessionStore, Turn};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use tutor_common::config::Config;
use tutor_common::logging::generate_trace_id;
use tutor_common::util::{sanitize_for_log, truncate_with_ellipsis};

const LOG_PREVIEW_CHARS: usize = 80;

/// Tunables for the relay, taken from the `llm` and `relay` config sections.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: i64,
    /// Retention ceiling, priming turn included.
    pub max_turns: usize,
    /// Size of the recent-turn window written to the debug log.
    pub context_window: usize,
    pub upstream_timeout: Duration,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_output_tokens: config.llm.max_output_tokens,
            max_turns: config.relay.max_turns,
            context_window: config.relay.context_window,
            upstream_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Inbound chat call.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

impl ChatInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Greeting,
    Upstream,
    Fallback,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Upstream => "upstream",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of one chat call.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub session_id: String,
    pub source: ReplySource,
}

/// Use the caller's identifier verbatim, or mint a fresh one.
pub fn resolve_session_id(supplied: Option<String>) -> String {
    supplied
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Relays chat messages to the upstream provider with per-session history.
pub struct ChatRelay {
    store: Arc<dyn SessionStore>,
    provider: Arc<dyn Provider>,
    settings: RelaySettings,
}

impl ChatRelay {
    pub fn new(
        store: Arc<dyn SessionStore>,
        provider: Arc<dyn Provider>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Handle one chat message.
    ///
    /// Fails only when the message is missing or empty; every other path,
    /// whitespace-only messages included, produces a non-empty reply.
    pub async fn handle(&self, input: ChatInput) -> Result<ChatOutcome, RelayError> {
        let message = input
            .message
            .filter(|m| !m.is_empty())
            .ok_or(RelayError::MissingMessage)?;
        let session_id = resolve_session_id(input.session_id);

        let span = tutor_common::chat_span!(generate_trace_id(), session_id = %session_id);
        self.converse(message, session_id).instrument(span).await
    }

    async fn converse(
        &self,
        message: String,
        session_id: String,
    ) -> Result<ChatOutcome, RelayError> {
        tracing::info!(
            message = %truncate_with_ellipsis(&message, LOG_PREVIEW_CHARS),
            "Chat message received"
        );

        if replies::is_greeting(&message) {
            tracing::info!(source = ReplySource::Greeting.as_str(), "Greeting short-circuit");
            return Ok(ChatOutcome {
                reply: replies::GREETING_REPLY.to_string(),
                session_id,
                source: ReplySource::Greeting,
            });
        }

        let (handle, created) = self
            .store
            .get_or_create(&session_id, PRIMING_INSTRUCTION)
            .await;

        // Held until the reply is appended: same-session requests run one at a time.
        let mut session = handle.lock().await;
        session.push(Turn::user(message.as_str()));

        let window: Vec<String> = session
            .recent(self.settings.context_window)
            .iter()
            .map(|t| {
                format!(
                    "{}: {}",
                    t.role().as_str(),
                    truncate_with_ellipsis(t.text(), LOG_PREVIEW_CHARS)
                )
            })
            .collect();
        tracing::debug!(
            created,
            turns = session.len(),
            recent = ?window,
            "Sending conversation upstream"
        );

        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: session.turns().iter().map(Message::from).collect(),
            max_tokens: Some(self.settings.max_output_tokens),
            temperature: Some(self.settings.temperature),
        };

        let (reply, source) = match self.call_upstream(request).await {
            Ok(text) => (text, ReplySource::Upstream),
            Err(e) => {
                tracing::warn!(
                    error = %sanitize_for_log(&e.to_string()),
                    status = ?e.status_code,
                    "Upstream call failed, using fallback reply"
                );
                (replies::fallback_reply(&message).to_string(), ReplySource::Fallback)
            }
        };

        session.push(Turn::assistant(reply.as_str()));
        let evicted = session.enforce_ceiling(self.settings.max_turns);
        session.touch();

        tracing::info!(
            source = source.as_str(),
            turns = session.len(),
            evicted,
            "Chat reply ready"
        );

        Ok(ChatOutcome {
            reply,
            session_id,
            source,
        })
    }

    /// One best-effort upstream attempt bounded by the configured timeout.
    async fn call_upstream(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let model = request.model.clone();
        let timeout = self.settings.upstream_timeout;

        match tokio::time::timeout(timeout, self.provider.chat(request)).await {
            Ok(Ok(response)) if !response.content.trim().is_empty() => {
                tracing::debug!(
                    latency_ms = response.latency_ms,
                    total_tokens = response.usage.total_tokens,
                    "Upstream reply received"
                );
                Ok(response.content)
            }
            Ok(Ok(_)) => Err(ProviderError::new(
                self.provider.name(),
                model,
                "Empty reply text",
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::new(
                self.provider.name(),
                model,
                format!("Timed out after {}s", timeout.as_secs_f64()),
            )),
        }
    }
}
