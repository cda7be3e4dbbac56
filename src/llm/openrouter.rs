// ABOUTME: Hosted OpenAI-compatible chat-completion provider (OpenRouter)
// ABOUTME: Non-streaming dispatch with provider error-code classification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # OpenRouter Provider
//!
//! Client for the hosted OpenAI-compatible `chat/completions` endpoint.
//! Requests are dispatched non-streaming; the full answer arrives in a
//! single response body. Known provider error shapes
//! (`invalid_request_error`, `rate_limit_exceeded`, `insufficient_quota`)
//! are classified into distinct error codes so callers can show distinct
//! user-facing messages.

use async_trait::async_trait;
use futures_util::stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider, StreamChunk,
    TokenUsage,
};
use crate::config::OpenRouterConfig;
use crate::errors::{AppError, ErrorCode};

/// Connection timeout for the hosted API
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Request timeout; hosted completions respond well within a minute
const REQUEST_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Message structure for the OpenAI-compatible API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Hosted OpenAI-compatible chat-completion provider
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Create a new provider with the given configuration
    ///
    /// The credential may be absent; every completion call will then fail
    /// with a configuration error, which the answer facade converts into a
    /// user-facing fallback string.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenRouterConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), endpoint)
    }

    /// Require the configured credential or produce a configuration error
    fn require_api_key(&self) -> Result<&str, AppError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AppError::config("OPENROUTER_API_KEY is not set; cannot call the hosted provider")
        })
    }

    /// Classify an error response body into a distinct error code
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let detail = error_response.error;
            match detail.code.as_deref() {
                Some("invalid_request_error") => AppError::new(
                    ErrorCode::ExternalInvalidRequest,
                    format!("Provider rejected the request: {}", detail.message),
                ),
                Some("rate_limit_exceeded") => AppError::new(
                    ErrorCode::ExternalRateLimited,
                    format!("Provider rate limit exceeded: {}", detail.message),
                ),
                Some("insufficient_quota") => AppError::new(
                    ErrorCode::ExternalQuotaExceeded,
                    format!("Provider quota exhausted: {}", detail.message),
                ),
                _ => AppError::external_service(
                    "OpenRouter",
                    format!("API error ({status}): {}", detail.message),
                ),
            }
        } else {
            AppError::external_service(
                "OpenRouter",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }

    /// Map a reqwest transport failure into an external-service error
    fn transport_error(&self, e: &reqwest::Error) -> AppError {
        error!("Failed to reach OpenRouter at {}: {e}", self.config.api_url);
        if e.is_timeout() {
            AppError::external_service("OpenRouter", "Request timed out")
        } else if e.is_connect() {
            AppError::external_service(
                "OpenRouter",
                format!("Cannot connect to {}", self.config.api_url),
            )
        } else {
            AppError::external_service("OpenRouter", format!("Request failed: {e}"))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn display_name(&self) -> &'static str {
        "OpenRouter"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let api_key = self.require_api_key()?;
        let model = request.model.as_deref().unwrap_or(&self.config.model);

        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        debug!(
            model,
            messages = openai_request.messages.len(),
            "Sending chat completion request to OpenRouter"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "MathTutor AI Assistant")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("OpenRouter", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse OpenRouter response: {e} - body: {}",
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service("OpenRouter", format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("OpenRouter", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            chars = content.len(),
            finish_reason = ?choice.finish_reason,
            "Received response from OpenRouter"
        );

        Ok(ChatResponse {
            content,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        // The hosted backend is used in direct-response mode; emulate a
        // stream with the completed answer as a single final chunk.
        let response = self.complete(request).await?;
        let chunk = StreamChunk {
            delta: response.content,
            is_final: true,
            finish_reason: response.finish_reason,
        };
        Ok(Box::pin(stream::iter(vec![Ok(chunk)])))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let api_key = self.require_api_key()?;

        let response = self
            .client
            .get(self.api_url("models"))
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        Ok(response.status().is_success())
    }
}
