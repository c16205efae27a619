//! Upstream generative-language providers.
//!
//! The relay only depends on the [`Provider`] trait; [`GeminiProvider`] is the
//! production implementation and tests substitute scripted providers.

mod gemini;

pub use gemini::GeminiProvider;

use crate::session::{Turn, TurnRole};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for LLM providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Send a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Error from a provider. Never surfaced to relay callers.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub model: String,
    pub message: String,
    pub status_code: Option<u16>,
}

impl ProviderError {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.model, self.message)
    }
}

impl std::error::Error for ProviderError {}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Unified chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Ordered conversation, oldest first
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl From<&Turn> for Message {
    /// The priming instruction travels as an ordinary user turn.
    fn from(turn: &Turn) -> Self {
        let role = match turn.role() {
            TurnRole::Priming | TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: turn.text().to_string(),
        }
    }
}

/// Unified chat response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Provider name
    pub provider: String,
    /// Model used
    pub model: String,
    /// Response content
    pub content: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Response latency in milliseconds
    pub latency_ms: u64,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_from_turns() {
        assert_eq!(Message::from(&Turn::priming("p")).role, "user");
        assert_eq!(Message::from(&Turn::user("q")).role, "user");

        let reply = Message::from(&Turn::assistant("a"));
        assert_eq!(reply.role, "assistant");
        assert_eq!(reply.content, "a");
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::new("gemini", "gemini-2.5-flash", "boom").with_status(503);
        assert_eq!(err.to_string(), "[gemini:gemini-2.5-flash] boom");
        assert_eq!(err.status_code, Some(503));
    }

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gemini-2.5-flash".into(),
            messages: vec![Message::from(&Turn::user("Xin hỏi"))],
            max_tokens: Some(2000),
            temperature: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("gemini-2.5-flash"));
        assert!(json.contains("Xin hỏi"));
        assert!(!json.contains("temperature"));
    }
}
