// ABOUTME: Unified provider selector and the never-fails answer facade
// ABOUTME: Applies the prompt token budget and absorbs provider failures into fallback text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Answer Provider
//!
//! [`ChatProvider`] selects the configured backend (hosted API or local
//! runner) behind a single enum. [`AnswerProvider`] is the facade the rest
//! of the server talks to: it clamps the prompt to the token budget,
//! dispatches with the configured generation parameters, and converts every
//! provider-side failure into a short user-facing fallback string while
//! logging the underlying cause for operators. Callers of
//! [`AnswerProvider::get_answer`] can therefore never observe an error.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::{
    ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider, OllamaProvider,
    OpenRouterProvider, PromptContext, PROMPT_TOKEN_BUDGET,
};
use crate::config::{LlmBackend, LlmConfig};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Fallback text when the provider responds with empty content
const NO_ANSWER_FALLBACK: &str =
    "No answer could be produced. Please try rephrasing your question.";

/// Fallback text for unclassified provider failures
const GENERIC_ERROR_FALLBACK: &str = "Error getting an answer from the AI provider.";

/// Unified chat provider wrapping the configured backend
///
/// This enum provides a consistent interface regardless of which
/// underlying provider is configured.
pub enum ChatProvider {
    /// Hosted OpenAI-compatible API
    OpenRouter(OpenRouterProvider),
    /// Local model runner
    Ollama(OllamaProvider),
}

impl ChatProvider {
    /// Create a provider from the immutable LLM configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed. A missing
    /// hosted-API credential is not an error here; it surfaces on the first
    /// completion call through the fallback-string contract.
    pub fn from_config(config: &LlmConfig) -> AppResult<Self> {
        info!(
            "Initializing LLM provider: {} (set {} to change)",
            config.backend,
            LlmBackend::ENV_VAR
        );

        match config.backend {
            LlmBackend::OpenRouter => Ok(Self::OpenRouter(OpenRouterProvider::new(
                config.openrouter.clone(),
            )?)),
            LlmBackend::Ollama => Ok(Self::Ollama(OllamaProvider::new(config.ollama.clone())?)),
        }
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenRouter(_) => f.debug_tuple("ChatProvider::OpenRouter").finish(),
            Self::Ollama(_) => f.debug_tuple("ChatProvider::Ollama").finish(),
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::OpenRouter(p) => p.name(),
            Self::Ollama(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::OpenRouter(p) => p.display_name(),
            Self::Ollama(p) => p.display_name(),
        }
    }

    fn capabilities(&self) -> LlmCapabilities {
        match self {
            Self::OpenRouter(p) => p.capabilities(),
            Self::Ollama(p) => p.capabilities(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::OpenRouter(p) => p.default_model(),
            Self::Ollama(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match self {
            Self::OpenRouter(p) => p.complete(request).await,
            Self::Ollama(p) => p.complete(request).await,
        }
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        match self {
            Self::OpenRouter(p) => p.complete_stream(request).await,
            Self::Ollama(p) => p.complete_stream(request).await,
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        match self {
            Self::OpenRouter(p) => p.health_check().await,
            Self::Ollama(p) => p.health_check().await,
        }
    }
}

/// Facade over a chat provider with the always-resolves answer contract
///
/// Holds the generation parameters from configuration so call sites never
/// read process-wide state. The provider is a trait object so tests can
/// substitute a stub.
#[derive(Clone)]
pub struct AnswerProvider {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerProvider {
    /// Build the facade and its backend from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be constructed.
    pub fn from_config(config: &LlmConfig) -> AppResult<Self> {
        let provider = ChatProvider::from_config(config)?;
        Ok(Self::with_provider(
            Arc::new(provider),
            config.max_tokens,
            config.temperature,
        ))
    }

    /// Wrap an existing provider (used by tests to inject stubs)
    #[must_use]
    pub fn with_provider(provider: Arc<dyn LlmProvider>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            provider,
            max_tokens,
            temperature,
        }
    }

    /// Dispatch a prompt and return the trimmed answer, propagating errors
    ///
    /// The prompt is clamped to the token budget before dispatch. An empty
    /// trimmed answer is returned as `Ok(String::new())`; classifying it is
    /// up to the caller.
    ///
    /// # Errors
    ///
    /// Returns provider-level errors (configuration, transport, API).
    pub async fn try_answer(&self, context: &PromptContext) -> AppResult<String> {
        let messages = context.clamp_to_budget(PROMPT_TOKEN_BUDGET);
        let request = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(&request).await?;
        Ok(response.content.trim().to_owned())
    }

    /// Dispatch a prompt and always return answer text
    ///
    /// On any provider failure this resolves to a short human-readable
    /// fallback string describing the error class; the underlying cause is
    /// only visible in the logs. No retry is attempted: each call either
    /// returns real content or a fallback string, which keeps the
    /// conversation flow always-responsive.
    pub async fn get_answer(&self, context: &PromptContext) -> String {
        match self.try_answer(context).await {
            Ok(answer) if answer.is_empty() => {
                warn!(
                    provider = self.provider.name(),
                    "Provider returned an empty answer"
                );
                NO_ANSWER_FALLBACK.to_owned()
            }
            Ok(answer) => answer,
            Err(e) => {
                error!(
                    provider = self.provider.name(),
                    code = ?e.code,
                    "Provider call failed: {e}"
                );
                Self::fallback_for(&e).to_owned()
            }
        }
    }

    /// Map an error class to its user-facing fallback string
    ///
    /// Exposed so the turn orchestrator can substitute fallback text while
    /// still distinguishing the empty-answer case, which must fail the
    /// request instead of being persisted.
    #[must_use]
    pub fn fallback_for(error: &AppError) -> &'static str {
        match error.code {
            ErrorCode::ConfigError => {
                "The AI assistant is not configured. Please contact the administrator."
            }
            ErrorCode::ExternalInvalidRequest => {
                "The AI provider rejected the request. Check the model configuration."
            }
            ErrorCode::ExternalRateLimited => {
                "The AI provider rate limit was exceeded. Please try again in a few moments."
            }
            ErrorCode::ExternalQuotaExceeded => {
                "The AI provider quota is exhausted. Please check the account balance."
            }
            _ => GENERIC_ERROR_FALLBACK,
        }
    }

    /// Name of the wrapped provider (for logs and health output)
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StreamChunk;
    use futures_util::stream;

    /// Stub provider with scripted behavior
    struct StubProvider {
        reply: Result<String, ErrorCode>,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn display_name(&self) -> &'static str {
            "Stub"
        }

        fn capabilities(&self) -> LlmCapabilities {
            LlmCapabilities::text_only()
        }

        fn default_model(&self) -> &str {
            "stub-model"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
            match &self.reply {
                Ok(content) => Ok(ChatResponse {
                    content: content.clone(),
                    model: "stub-model".to_owned(),
                    usage: None,
                    finish_reason: Some("stop".to_owned()),
                }),
                Err(code) => Err(AppError::new(*code, "scripted failure")),
            }
        }

        async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
            let response = self.complete(request).await?;
            Ok(Box::pin(stream::iter(vec![Ok(StreamChunk {
                delta: response.content,
                is_final: true,
                finish_reason: response.finish_reason,
            })])))
        }

        async fn health_check(&self) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    fn facade(reply: Result<String, ErrorCode>) -> AnswerProvider {
        AnswerProvider::with_provider(Arc::new(StubProvider { reply }), 200, 0.1)
    }

    #[tokio::test]
    async fn test_get_answer_trims_content() {
        let answers = facade(Ok("  2x  ".to_owned()));
        let context = PromptContext::new("sys", "derivative of x^2?");
        assert_eq!(answers.get_answer(&context).await, "2x");
    }

    #[tokio::test]
    async fn test_empty_answer_yields_no_answer_fallback() {
        let answers = facade(Ok("   ".to_owned()));
        let context = PromptContext::new("sys", "q");
        assert_eq!(answers.get_answer(&context).await, NO_ANSWER_FALLBACK);
    }

    #[tokio::test]
    async fn test_error_classes_yield_distinct_fallbacks() {
        let context = PromptContext::new("sys", "q");

        let rate_limited = facade(Err(ErrorCode::ExternalRateLimited))
            .get_answer(&context)
            .await;
        let quota = facade(Err(ErrorCode::ExternalQuotaExceeded))
            .get_answer(&context)
            .await;
        let config = facade(Err(ErrorCode::ConfigError)).get_answer(&context).await;
        let generic = facade(Err(ErrorCode::ExternalServiceError))
            .get_answer(&context)
            .await;

        assert!(rate_limited.contains("rate limit"));
        assert!(quota.contains("quota"));
        assert!(config.contains("not configured"));
        assert_eq!(generic, GENERIC_ERROR_FALLBACK);
        assert_ne!(rate_limited, quota);
    }

    #[tokio::test]
    async fn test_try_answer_propagates_errors() {
        let answers = facade(Err(ErrorCode::ExternalServiceError));
        let context = PromptContext::new("sys", "q");
        assert!(answers.try_answer(&context).await.is_err());
    }
}
