// ABOUTME: Conversation-turn orchestration for the ask-the-AI flow
// ABOUTME: Resolves the conversation, builds the bounded prompt, dispatches, persists, names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Conversation-Turn Orchestration
//!
//! One `ask` request runs the sequential chain: resolve (or create) the
//! conversation, load bounded history, build the role-tagged prompt, await
//! the provider, persist the exchange, then best-effort naming. Only the
//! primary action's own failures surface to the caller; the naming step is
//! logged and swallowed and never rolls back the persisted turn.
//!
//! Two concurrent `ask` calls against the same conversation may interleave
//! their history reads and writes. No per-conversation locking is applied;
//! the second call's history may or may not include the first call's turn.

use tracing::{info, warn};

use crate::config::NamingMode;
use crate::database::{ConversationRecord, MessageRecord};
use crate::errors::{AppError, AppResult};
use crate::formatters::format_math;
use crate::llm::prompts::tutor_system_prompt;
use crate::llm::{AnswerProvider, PromptContext};
use crate::resources::ServerResources;
use crate::services::naming;

/// At most this many recent question/answer pairs enter the prompt, before
/// token budgeting trims further
const HISTORY_EXCHANGE_LIMIT: i64 = 8;

/// Parameters of one ask request
#[derive(Debug, Clone)]
pub struct AskParams {
    /// User asking the question
    pub user_id: String,
    /// The question text
    pub question: String,
    /// Existing conversation to continue; absent (or JSON null) starts a
    /// new conversation
    pub conversation_id: Option<String>,
    /// Marks a newly created conversation as an AI tutor chat
    pub is_chat_ia: bool,
    /// Skip math display markup in the answer
    pub disable_latex: bool,
}

/// Result of one ask request
#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// The persisted question/answer exchange
    pub message: MessageRecord,
    /// The (possibly just created, possibly just named) conversation
    pub conversation: ConversationRecord,
}

/// Run one conversation turn end to end
///
/// # Errors
///
/// Returns `ResourceNotFound` if a supplied `conversation_id` is unknown,
/// `InternalError` if the provider yields an empty answer (nothing is
/// persisted in that case), and database errors from the persistence steps.
pub async fn ask(resources: &ServerResources, params: AskParams) -> AppResult<AskOutcome> {
    let conversations = resources.database.conversations();

    // Resolve or create the conversation. A null id counts as absent.
    let (conversation, created) = match params.conversation_id.as_deref() {
        Some(id) => {
            let conversation = conversations
                .get(id)
                .await?
                .ok_or_else(|| AppError::not_found("Conversation"))?;
            (conversation, false)
        }
        None => {
            let conversation = conversations
                .create(&params.user_id, None, params.is_chat_ia)
                .await?;
            info!(
                conversation_id = %conversation.id,
                user_id = %params.user_id,
                "created conversation for new exchange"
            );
            (conversation, true)
        }
    };

    // Bounded history, oldest first
    let history = conversations
        .get_recent_messages(&conversation.id, HISTORY_EXCHANGE_LIMIT)
        .await?;

    // Build the prompt: persona + one user/assistant pair per completed
    // exchange + the live question
    let mut context = PromptContext::new(
        tutor_system_prompt(params.disable_latex),
        params.question.clone(),
    );
    for entry in &history {
        if let Some(answer) = &entry.answer {
            context.push_exchange(&entry.question, answer);
        }
    }

    // Await the provider. Provider failures become fallback answer text and
    // still get persisted; an empty answer fails the request instead.
    let answer = match resources.answers.try_answer(&context).await {
        Ok(text) => text,
        Err(e) => {
            warn!(code = ?e.code, "provider call failed, persisting fallback answer: {e}");
            AnswerProvider::fallback_for(&e).to_owned()
        }
    };
    if answer.is_empty() {
        return Err(AppError::internal(
            "The assistant could not generate a response",
        ));
    }

    let answer = if params.disable_latex {
        answer
    } else {
        format_math(&answer)
    };

    // Durable record of the exchange
    let message = conversations
        .add_message(&conversation.id, &params.question, Some(&answer))
        .await?;

    // Best-effort naming; never fails the request, never rolls back the turn
    let conversation = finish_conversation(resources, conversation, created, &params.question).await;

    Ok(AskOutcome {
        message,
        conversation,
    })
}

/// Generate a fresh name for a conversation from its first stored message
///
/// Backs the explicit generate-name endpoint. Unlike the best-effort step
/// inside `ask`, failures here surface to the caller.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown conversation and
/// `InvalidInput` when the conversation has no messages yet.
pub async fn generate_conversation_name(
    resources: &ServerResources,
    conversation_id: &str,
) -> AppResult<(String, ConversationRecord)> {
    let conversations = resources.database.conversations();

    conversations
        .get(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation"))?;

    let first = conversations
        .first_message(conversation_id)
        .await?
        .ok_or_else(|| AppError::invalid_input("Conversation has no messages"))?;

    let name = naming::generate_name(&resources.answers, &first.question).await;
    conversations.update_name(conversation_id, &name).await?;

    let conversation = conversations
        .get(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation"))?;

    Ok((name, conversation))
}

/// Apply best-effort naming and re-read the conversation for the response
///
/// Every failure in here is logged and swallowed; the caller always gets a
/// conversation record back.
async fn finish_conversation(
    resources: &ServerResources,
    conversation: ConversationRecord,
    created: bool,
    question: &str,
) -> ConversationRecord {
    let conversations = resources.database.conversations();

    let needs_name = if created {
        true
    } else if conversation
        .name
        .as_deref()
        .is_some_and(|n| !n.trim().is_empty())
    {
        false
    } else {
        // Unnamed pre-existing conversation: only name it when the turn we
        // just persisted is its only message
        conversations
            .message_count(&conversation.id)
            .await
            .map_or(false, |count| count == 1)
    };

    if needs_name {
        let name = match resources.config.naming_mode {
            NamingMode::Ai => naming::generate_name(&resources.answers, question).await,
            NamingMode::Heuristic => naming::heuristic_name(question),
        };

        if naming::validate_name(&name) {
            if let Err(e) = conversations.update_name(&conversation.id, &name).await {
                warn!(
                    conversation_id = %conversation.id,
                    "conversation naming failed (request unaffected): {e}"
                );
            }
        }
    }

    // Re-read so the response carries the bumped timestamp and any new name
    match conversations.get(&conversation.id).await {
        Ok(Some(fresh)) => fresh,
        Ok(None) | Err(_) => conversation,
    }
}
