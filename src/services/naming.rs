// ABOUTME: Conversation naming service with AI generation and keyword fallback
// ABOUTME: Total functions - naming never fails and never returns an empty string
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Conversation Naming Service
//!
//! Derives a short human-readable title for a new conversation from its
//! first user message. The primary path asks the answer provider for a
//! concise topic title; when that fails or produces something unusable, a
//! deterministic keyword table and finally the message's own first words
//! take over. Every entry point is total: no error ever escapes, and the
//! result is never empty.

use tracing::{debug, warn};

use crate::llm::{AnswerProvider, PromptContext};

/// Name used when nothing better can be derived
pub const DEFAULT_NAME: &str = "New conversation";

/// Hard bound on the displayed name length
const MAX_DISPLAY_LEN: usize = 40;

/// Generated names shorter than this fall through to the keyword fallback
const MIN_NAME_LEN: usize = 3;

/// The first message is cut to this many characters before being sent
/// externally, to bound cost and latency
const MAX_PROMPT_INPUT_LEN: usize = 200;

/// Heuristic naming takes this many leading characters of the question
const HEURISTIC_NAME_LEN: usize = 50;

/// Domain keywords mapped to display topics for the deterministic fallback
const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("derivative", "Derivatives"),
    ("integral", "Integrals"),
    ("limit", "Limits"),
    ("function", "Functions"),
    ("equation", "Equations"),
    ("matrix", "Matrices"),
    ("vector", "Vectors"),
    ("trigonometric", "Trigonometry"),
    ("logarithm", "Logarithms"),
    ("exponential", "Exponentials"),
    ("polynomial", "Polynomials"),
    ("series", "Series"),
    ("summation", "Summations"),
];

/// System instruction for the title-generation prompt
const NAMING_INSTRUCTION: &str = "\
You generate concise titles for math conversations.

INSTRUCTIONS:
- Generate a short topic title, at most 40 characters
- Be descriptive and specific to the mathematical subject
- Use appropriate technical terms
- Focus on the main concept
- No quotes, no trailing punctuation
- If the message is not about mathematics, use \"General question\"

EXAMPLES:
- Derivatives of quadratic functions
- Chain rule explained
- Limits and continuity
- Integration by parts
- Mean value theorem";

/// Generate a display name for a conversation from its first message
///
/// Always resolves to a non-empty string of at most 40 characters
/// (plus an ellipsis when hard-truncated).
pub async fn generate_name(answers: &AnswerProvider, first_message: &str) -> String {
    if first_message.trim().is_empty() {
        return DEFAULT_NAME.to_owned();
    }

    let truncated = truncate_chars(first_message, MAX_PROMPT_INPUT_LEN);
    let context = PromptContext::new(
        NAMING_INSTRUCTION,
        format!("Generate a title for this math conversation: \"{truncated}\""),
    );

    let generated = match answers.try_answer(&context).await {
        Ok(text) => text,
        Err(e) => {
            warn!("AI conversation naming failed, using fallback: {e}");
            return fallback_name(first_message);
        }
    };

    let clean = clean_generated_name(&generated);
    if clean.chars().count() < MIN_NAME_LEN {
        return fallback_name(first_message);
    }

    debug!(name = %clean, "generated conversation name");
    clean
}

/// Heuristic naming: the first ~50 characters of the opening question
#[must_use]
pub fn heuristic_name(question: &str) -> String {
    let name = truncate_chars(question.trim(), HEURISTIC_NAME_LEN)
        .trim()
        .to_owned();
    if name.is_empty() {
        DEFAULT_NAME.to_owned()
    } else {
        name
    }
}

/// Deterministic fallback when AI naming is unavailable or unusable
///
/// Scans the message against the topic keyword table, then falls back to
/// the message's first few words, then to the generic default.
#[must_use]
pub fn fallback_name(message: &str) -> String {
    let lower = message.to_lowercase();
    for (keyword, topic) in TOPIC_KEYWORDS {
        if lower.contains(keyword) {
            return format!("About {topic}");
        }
    }

    let short: String = message
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ");

    if short.is_empty() {
        DEFAULT_NAME.to_owned()
    } else {
        bound_display_length(&short)
    }
}

/// Validate a user-supplied conversation name
///
/// True iff the trimmed name is between 1 and 255 characters.
#[must_use]
pub fn validate_name(name: &str) -> bool {
    let len = name.trim().chars().count();
    (1..=255).contains(&len)
}

/// Strip quotes and list markers from a generated title, then bound it
fn clean_generated_name(generated: &str) -> String {
    let stripped: String = generated
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '`'))
        .collect();
    let stripped = stripped
        .trim_start_matches(['-', '*', ' '])
        .trim()
        .trim_end_matches(['.', '!'])
        .trim();

    bound_display_length(stripped)
}

/// Hard-truncate to the display bound, appending an ellipsis marker
fn bound_display_length(name: &str) -> String {
    if name.chars().count() > MAX_DISPLAY_LEN {
        let cut: String = name.chars().take(MAX_DISPLAY_LEN - 3).collect();
        format!("{}...", cut.trim_end())
    } else {
        name.to_owned()
    }
}

/// Truncate to a bounded number of characters, marking the cut
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::llm::{
        ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider, StreamChunk,
    };
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::Arc;

    struct ScriptedProvider {
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn display_name(&self) -> &'static str {
            "Scripted"
        }

        fn capabilities(&self) -> LlmCapabilities {
            LlmCapabilities::text_only()
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }

        async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, AppError> {
            match &self.reply {
                Some(content) => Ok(ChatResponse {
                    content: content.clone(),
                    model: "scripted-model".to_owned(),
                    usage: None,
                    finish_reason: Some("stop".to_owned()),
                }),
                None => Err(AppError::external_service("scripted", "down")),
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

    fn answers(reply: Option<&str>) -> AnswerProvider {
        AnswerProvider::with_provider(
            Arc::new(ScriptedProvider {
                reply: reply.map(ToOwned::to_owned),
            }),
            200,
            0.1,
        )
    }

    #[test]
    fn test_validate_name_bounds() {
        assert!(!validate_name(""));
        assert!(!validate_name("   "));
        assert!(validate_name("a"));
        assert!(validate_name(&"x".repeat(255)));
        assert!(!validate_name(&"x".repeat(256)));
        // Trimming happens before the length check
        assert!(validate_name(&format!("  {}  ", "x".repeat(255))));
    }

    #[test]
    fn test_fallback_name_uses_keyword_table() {
        assert_eq!(
            fallback_name("What is the derivative of x^2?"),
            "About Derivatives"
        );
        assert_eq!(fallback_name("Solve this EQUATION please"), "About Equations");
    }

    #[test]
    fn test_fallback_name_uses_first_words() {
        assert_eq!(fallback_name("how do I prove this thing"), "how do I prove");
    }

    #[test]
    fn test_fallback_name_default_on_empty() {
        assert_eq!(fallback_name(""), DEFAULT_NAME);
        assert_eq!(fallback_name("   "), DEFAULT_NAME);
    }

    #[test]
    fn test_heuristic_name_bounds() {
        assert_eq!(heuristic_name("short question"), "short question");
        let long = "q".repeat(120);
        let name = heuristic_name(&long);
        assert!(name.chars().count() <= HEURISTIC_NAME_LEN + 3);
        assert_eq!(heuristic_name("  "), DEFAULT_NAME);
    }

    #[tokio::test]
    async fn test_generate_name_empty_input_returns_default() {
        let name = generate_name(&answers(Some("unused")), "   ").await;
        assert_eq!(name, DEFAULT_NAME);
    }

    #[tokio::test]
    async fn test_generate_name_cleans_provider_output() {
        let name = generate_name(
            &answers(Some("- \"Derivatives of quadratic functions.\"")),
            "derivatives please",
        )
        .await;
        assert_eq!(name, "Derivatives of quadratic functions");
    }

    #[tokio::test]
    async fn test_generate_name_truncates_long_output() {
        let name = generate_name(
            &answers(Some(&"Very long generated title ".repeat(5))),
            "question",
        )
        .await;
        assert!(name.chars().count() <= MAX_DISPLAY_LEN + 3);
        assert!(name.ends_with("..."));
    }

    #[tokio::test]
    async fn test_generate_name_falls_back_when_provider_fails() {
        let name = generate_name(&answers(None), "What is the derivative of x^2?").await;
        assert_eq!(name, "About Derivatives");
    }

    #[tokio::test]
    async fn test_generate_name_falls_back_on_too_short_output() {
        let name = generate_name(&answers(Some("ok")), "limit of a sequence").await;
        assert_eq!(name, "About Limits");
    }

    #[tokio::test]
    async fn test_generated_names_are_bounded_and_non_empty() {
        for reply in [Some("A sensible title"), Some(""), None] {
            let name = generate_name(&answers(reply), "tell me about vector spaces").await;
            let len = name.chars().count();
            assert!(len >= 1 && len <= 50, "bad length {len} for {name:?}");
        }
    }
}
