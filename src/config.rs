// ABOUTME: Environment-sourced server configuration built once at startup
// ABOUTME: Immutable config structs passed into components at construction time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Server Configuration
//!
//! All configuration is read from the environment exactly once, at startup,
//! into immutable structs. Components receive their configuration at
//! construction time; nothing reads process-wide state at call time, so
//! tests can substitute configurations without mutating the environment.
//!
//! A missing provider credential is not a startup error: it surfaces later
//! through the answer provider's fallback-string contract.

use std::env;
use std::fmt;

/// Default HTTP port for the REST API
const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default SQLite database location
const DEFAULT_DATABASE_URL: &str = "sqlite:data/mathtutor.db";

/// Default hosted chat-completion endpoint
const DEFAULT_OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

/// Default hosted model
const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-small-3.1-24b-instruct:free";

/// Default local model runner endpoint
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default local model
const DEFAULT_OLLAMA_MODEL: &str = "mistral";

/// Default cap on provider output tokens
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Which external chat-completion backend answers tutor questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    /// Hosted OpenAI-compatible API (OpenRouter)
    #[default]
    OpenRouter,
    /// Local model runner (Ollama)
    Ollama,
}

impl LlmBackend {
    /// Environment variable selecting the backend
    pub const ENV_VAR: &'static str = "LLM_BACKEND";

    /// Parse the backend from the environment, defaulting to the hosted API
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(Self::ENV_VAR).as_deref() {
            Ok("ollama") | Ok("local") => Self::Ollama,
            _ => Self::OpenRouter,
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenRouter => write!(f, "openrouter"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// How new conversations get their display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// Ask the answer provider for a concise topic title
    #[default]
    Ai,
    /// Take the first ~50 characters of the opening question
    Heuristic,
}

impl NamingMode {
    /// Environment variable selecting the naming mode
    pub const ENV_VAR: &'static str = "NAMING_MODE";

    /// Parse the naming mode from the environment, defaulting to AI naming
    #[must_use]
    pub fn from_env() -> Self {
        match env::var(Self::ENV_VAR).as_deref() {
            Ok("heuristic") | Ok("simple") => Self::Heuristic,
            _ => Self::Ai,
        }
    }
}

/// Configuration for the hosted OpenAI-compatible backend
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Base URL of the chat-completion API
    pub api_url: String,
    /// Bearer credential; absence is surfaced as a provider-level
    /// configuration failure, not a startup crash
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
}

/// Configuration for the local model runner backend
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the local runner
    pub url: String,
    /// Model name loaded by the runner
    pub model: String,
}

/// LLM provider configuration shared by both backends
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which backend to dispatch to
    pub backend: LlmBackend,
    /// Hosted API settings
    pub openrouter: OpenRouterConfig,
    /// Local runner settings
    pub ollama: OllamaConfig,
    /// Maximum tokens the provider may generate per answer
    pub max_tokens: u32,
    /// Sampling temperature for generation
    pub temperature: f32,
}

impl LlmConfig {
    /// Build the LLM configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let max_tokens = env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        Self {
            backend: LlmBackend::from_env(),
            openrouter: OpenRouterConfig {
                api_url: env::var("OPENROUTER_API_URL")
                    .unwrap_or_else(|_| DEFAULT_OPENROUTER_API_URL.to_owned()),
                api_key: env::var("OPENROUTER_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env::var("OPENROUTER_MODEL")
                    .unwrap_or_else(|_| DEFAULT_OPENROUTER_MODEL.to_owned()),
            },
            ollama: OllamaConfig {
                url: env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_owned()),
                model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_owned()),
            },
            max_tokens,
            temperature,
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port the REST API binds to
    pub http_port: u16,
    /// Database connection string
    pub database_url: String,
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Conversation naming strategy
    pub naming_mode: NamingMode,
}

impl ServerConfig {
    /// Load the full server configuration from the environment
    #[must_use]
    pub fn from_env() -> Self {
        let http_port = env::var("HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        Self {
            http_port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned()),
            llm: LlmConfig::from_env(),
            naming_mode: NamingMode::from_env(),
        }
    }

    /// One-line startup summary for the logs (credentials omitted)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} llm_backend={} model={} naming={:?}",
            self.http_port,
            self.database_url,
            self.llm.backend,
            match self.llm.backend {
                LlmBackend::OpenRouter => &self.llm.openrouter.model,
                LlmBackend::Ollama => &self.llm.ollama.model,
            },
            self.naming_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = LlmConfig {
            backend: LlmBackend::default(),
            openrouter: OpenRouterConfig {
                api_url: DEFAULT_OPENROUTER_API_URL.to_owned(),
                api_key: None,
                model: DEFAULT_OPENROUTER_MODEL.to_owned(),
            },
            ollama: OllamaConfig {
                url: DEFAULT_OLLAMA_URL.to_owned(),
                model: DEFAULT_OLLAMA_MODEL.to_owned(),
            },
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        assert_eq!(config.backend, LlmBackend::OpenRouter);
        assert!(config.openrouter.api_key.is_none());
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(LlmBackend::OpenRouter.to_string(), "openrouter");
        assert_eq!(LlmBackend::Ollama.to_string(), "ollama");
    }
}
