// ABOUTME: Local model runner provider (Ollama) with NDJSON streaming
// ABOUTME: Line-buffered stream parsing that tolerates partial lines across TCP chunks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Ollama Provider
//!
//! Client for a local model runner speaking the Ollama `api/chat` protocol.
//! Streaming responses arrive as newline-delimited JSON fragments which are
//! concatenated into the full answer. TCP does not guarantee alignment
//! between network chunks and line boundaries, so a line buffer accumulates
//! partial data until a complete line is available.

use async_trait::async_trait;
use futures_util::{future, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::mem;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider, StreamChunk,
};
use crate::config::OllamaConfig;
use crate::errors::AppError;

/// Connection timeout; local runners are either up or not
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Request timeout; local inference can be slow
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// API Request/Response Types (Ollama chat format)
// ============================================================================

/// Ollama chat request structure
#[derive(Debug, Serialize)]
struct OllamaApiRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Generation options forwarded to the runner
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Message structure for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// One NDJSON fragment of a chat response (streaming or not)
#[derive(Debug, Deserialize)]
struct OllamaApiChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

// ============================================================================
// NDJSON Line Buffering
// ============================================================================

/// Line-buffering parser for NDJSON streams
///
/// Complete lines (terminated by `\n`) are parsed into [`StreamChunk`]
/// values; a trailing partial line stays in the buffer for the next `feed`.
#[derive(Debug, Default)]
struct NdjsonLineBuffer {
    buffer: String,
}

impl NdjsonLineBuffer {
    /// Feed raw bytes from a TCP chunk, returning any complete chunks
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AppError>> {
        let text = String::from_utf8_lossy(bytes);
        self.buffer.push_str(&text);

        let mut chunks = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim_end_matches('\r').to_owned();
            self.buffer = self.buffer[newline_pos + 1..].to_owned();

            if let Some(chunk) = Self::parse_line(&line) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Flush any partial trailing line when the byte stream ends
    fn flush(&mut self) -> Option<Result<StreamChunk, AppError>> {
        let remaining = mem::take(&mut self.buffer);
        Self::parse_line(&remaining)
    }

    /// Parse a single NDJSON line into a stream chunk
    fn parse_line(line: &str) -> Option<Result<StreamChunk, AppError>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        match serde_json::from_str::<OllamaApiChunk>(trimmed) {
            Ok(chunk) => {
                if let Some(message) = chunk.error {
                    return Some(Err(AppError::external_service(
                        "Ollama",
                        format!("Stream error: {message}"),
                    )));
                }
                Some(Ok(StreamChunk {
                    delta: chunk.message.map(|m| m.content).unwrap_or_default(),
                    is_final: chunk.done,
                    finish_reason: chunk.done.then(|| "stop".to_owned()),
                }))
            }
            Err(e) => {
                warn!("Failed to parse Ollama stream line: {e}");
                None
            }
        }
    }
}

/// Internal state for the NDJSON stream unfold
struct NdjsonStreamState {
    parser: NdjsonLineBuffer,
    pending: VecDeque<Result<StreamChunk, AppError>>,
    stream_ended: bool,
}

/// Wrap a raw byte stream with NDJSON line buffering
fn create_ndjson_stream<S>(byte_stream: S) -> ChatStream
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
{
    let state = NdjsonStreamState {
        parser: NdjsonLineBuffer::default(),
        pending: VecDeque::new(),
        stream_ended: false,
    };

    let stream = futures_util::stream::unfold(
        (
            Box::pin(byte_stream)
                as Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
            state,
        ),
        |(mut byte_stream, mut state)| async move {
            loop {
                // Drain pending chunks first (multiple lines per TCP chunk)
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, (byte_stream, state)));
                }

                if state.stream_ended {
                    return None;
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        state.pending.extend(state.parser.feed(&bytes));
                    }
                    Some(Err(e)) => {
                        state.stream_ended = true;
                        return Some((
                            Err(AppError::external_service(
                                "Ollama",
                                format!("Stream read error: {e}"),
                            )),
                            (byte_stream, state),
                        ));
                    }
                    None => {
                        state.stream_ended = true;
                        if let Some(item) = state.parser.flush() {
                            state.pending.push_back(item);
                        }
                        if let Some(item) = state.pending.pop_front() {
                            return Some((item, (byte_stream, state)));
                        }
                        return None;
                    }
                }
            }
        },
    );

    // Drop empty deltas unless final
    let filtered = stream.filter(|result| {
        future::ready(
            result
                .as_ref()
                .map_or(true, |chunk| !chunk.delta.is_empty() || chunk.is_final),
        )
    });

    Box::pin(filtered)
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Local model runner provider speaking the Ollama chat protocol
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OllamaConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), endpoint)
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> OllamaApiRequest {
        OllamaApiRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    /// Map a reqwest transport failure into an external-service error
    fn transport_error(&self, e: &reqwest::Error) -> AppError {
        error!("Failed to reach Ollama at {}: {e}", self.config.url);
        if e.is_timeout() {
            AppError::external_service("Ollama", "Request timed out")
        } else if e.is_connect() {
            AppError::external_service(
                "Ollama",
                format!(
                    "Cannot connect to the local runner. Is it running at {}?",
                    self.config.url
                ),
            )
        } else {
            AppError::external_service("Ollama", format!("Request failed: {e}"))
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn display_name(&self) -> &'static str {
        "Ollama (Local)"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::STREAMING | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        // Consume the runner's native stream and assemble the full answer;
        // the non-streaming endpoint holds the connection silent for the
        // whole inference, which trips intermediate proxies.
        let mut stream = self.complete_stream(request).await?;

        let mut content = String::new();
        let mut finish_reason = None;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            content.push_str(&chunk.delta);
            if chunk.is_final {
                finish_reason = chunk.finish_reason;
                break;
            }
        }

        debug!(chars = content.len(), "Assembled streamed Ollama answer");

        Ok(ChatResponse {
            content,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            usage: None,
            finish_reason,
        })
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let api_request = self.build_request(request, true);

        debug!(
            model = %api_request.model,
            messages = api_request.messages.len(),
            "Sending streaming chat request to Ollama"
        );

        let response = self
            .client
            .post(self.api_url("api/chat"))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "Ollama",
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        Ok(create_ndjson_stream(response.bytes_stream()))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let response = self
            .client
            .get(self.api_url("api/tags"))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        Ok(response.status().is_success())
    }
}
