// ABOUTME: Token-budget clamping of chat prompts before provider dispatch
// ABOUTME: Explicit system/history/current-turn prompt shape with char-based token estimates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Prompt Context and Token Budgeting
//!
//! Outgoing prompts are modeled as an explicit [`PromptContext`] (system
//! prompt, ordered history, current turn) rather than a flat positional
//! list, so the "first element is system, last is the live question"
//! contract is carried by the type instead of by convention.
//!
//! Token counts are estimated without a tokenizer dependency as
//! `ceil(len / 4)`, which is close enough to bound prompt cost and avoid
//! provider-side truncation errors.

use tracing::debug;

use super::ChatMessage;

/// Conservative token budget reserved for the outgoing prompt, leaving
/// headroom for the provider's reply within its context window.
pub const PROMPT_TOKEN_BUDGET: usize = 3000;

/// Approximate token count of a string (1 token per 4 characters, rounded up)
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// The prompt for one conversation turn, before token clamping
///
/// `history` holds alternating user/assistant messages in chronological
/// order. The system prompt and current turn are stored separately because
/// they are never dropped by budgeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    /// Tutor persona and behavioral rules
    pub system_prompt: String,
    /// Prior turns, oldest first
    pub history: Vec<ChatMessage>,
    /// The question being asked right now
    pub current_turn: String,
}

impl PromptContext {
    /// Create a context with no history
    #[must_use]
    pub fn new(system_prompt: impl Into<String>, current_turn: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            current_turn: current_turn.into(),
        }
    }

    /// Append one stored question/answer exchange to the history
    pub fn push_exchange(&mut self, question: &str, answer: &str) {
        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer));
    }

    /// Total number of chat messages this context expands to, unclamped
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.history.len() + 2
    }

    /// Flatten into the role-tagged message list sent to a provider,
    /// bounding history to an approximate token budget.
    ///
    /// The system prompt and the current turn are unconditional anchors:
    /// they are always emitted even if their estimated tokens alone exceed
    /// `max_tokens` (the budget is best-effort, not a hard cap). History is
    /// admitted newest-first until the next message would overflow the
    /// budget; admission stops at the first overflow, so older history is
    /// never considered once a newer message did not fit. Retained messages
    /// come out in original chronological order.
    #[must_use]
    pub fn clamp_to_budget(&self, max_tokens: usize) -> Vec<ChatMessage> {
        let mut total = estimate_tokens(&self.system_prompt) + estimate_tokens(&self.current_turn);

        let mut retained: Vec<&ChatMessage> = Vec::new();
        for message in self.history.iter().rev() {
            let cost = estimate_tokens(&message.content);
            if total + cost > max_tokens {
                break;
            }
            total += cost;
            retained.push(message);
        }
        retained.reverse();

        if retained.len() < self.history.len() {
            debug!(
                kept = retained.len(),
                dropped = self.history.len() - retained.len(),
                estimated_tokens = total,
                budget = max_tokens,
                "prompt history truncated to fit token budget"
            );
        }

        let mut messages = Vec::with_capacity(retained.len() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(retained.into_iter().cloned());
        messages.push(ChatMessage::user(&self.current_turn));
        messages
    }
}
