//! Google Gemini provider.
//!
//! Calls `generateContent` with the API key as the `key` query parameter
//! and extracts the first candidate's first text part.

use super::{ChatRequest, ChatResponse, Provider, ProviderError, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tutor_common::config::LlmConfig;
use tutor_common::util::sanitize_for_log;

const PROVIDER: &str = "gemini";

/// Gemini provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    default_temperature: f64,
    default_max_tokens: i64,
    client: Client,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<i64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i64>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<i64>,
}

/// HTTP client with the configured timeouts, or a default client if the
/// builder fails. The relay's outer timeout still bounds every call.
fn build_client(llm: &LlmConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(llm.timeout_secs))
        .connect_timeout(Duration::from_secs(llm.connect_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build Gemini HTTP client, using defaults");
            Client::new()
        })
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl GeminiProvider {
    /// Create a provider from the `llm` config section.
    pub fn new(api_key: impl Into<String>, llm: &LlmConfig) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            default_temperature: llm.temperature,
            default_max_tokens: llm.max_output_tokens,
            client: build_client(llm),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let model_name = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!("{}/{model_name}:generateContent", self.base_url)
    }

    fn build_body(&self, request: &ChatRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|msg| Content {
                role: match msg.role.as_str() {
                    "assistant" => "model".to_string(),
                    other => other.to_string(),
                },
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(self.default_temperature),
                max_output_tokens: request.max_tokens.unwrap_or(self.default_max_tokens),
            },
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();
        let model = request.model.clone();
        let fail = |message: String| ProviderError::new(PROVIDER, model.clone(), message);

        let body = self.build_body(&request);

        let response = self
            .client
            .post(self.endpoint(&model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| fail(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Gemini response status");

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(fail(format!(
                "API error ({}): {}",
                status.as_u16(),
                sanitize_for_log(&error_text)
            ))
            .with_status(status.as_u16()));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| fail(format!("Failed to parse response: {}", e.without_url())))?;

        if let Some(err) = result.error {
            return Err(fail(format!("API error: {}", sanitize_for_log(&err.message))));
        }

        let candidate = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| fail("No candidates in response".into()))?;

        let content = candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| fail("Empty reply text".into()))?;

        let usage = result.usage_metadata.map_or(TokenUsage::default(), |u| TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count.unwrap_or(0),
        });

        Ok(ChatResponse {
            provider: PROVIDER.into(),
            model,
            content,
            usage,
            finish_reason: candidate.finish_reason,
            latency_ms: elapsed_ms(start),
        })
    }
}
