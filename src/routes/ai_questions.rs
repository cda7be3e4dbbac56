// ABOUTME: Route handlers for the ask-the-AI flow and stored question records
// ABOUTME: POST ask plus read-only listing of persisted exchanges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! AI question routes.
//!
//! `POST /api/ai-questions/ask` is the conversation-turn entry point; the
//! remaining endpoints are read-only access to the stored exchanges.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{require_uuid, PageQuery, Paged};
use crate::database::{ConversationRecord, MessageRecord};
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::chat_orchestration::{self, AskParams};

/// Route identifier attached to error payloads
const ROUTE: &str = "/api/ai-questions";

/// Request body for asking the AI tutor
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// User asking the question
    pub user_id: String,
    /// The question text (at least 2 characters)
    pub question: String,
    /// Existing conversation to continue; omit (or send null) to start a
    /// new one
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Mark a newly created conversation as an AI tutor chat
    #[serde(default)]
    pub is_chat_ia: bool,
    /// Ask for a plain-text answer without math display markup
    #[serde(default)]
    pub disable_latex: bool,
}

/// One persisted question/answer exchange
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message ID
    pub id: String,
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// The question asked
    pub question: String,
    /// The assistant's answer
    pub answer: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl From<MessageRecord> for MessageResponse {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            conversation_id: record.conversation_id,
            question: record.question,
            answer: record.answer,
            created_at: record.created_at,
        }
    }
}

/// Conversation summary returned alongside an answer
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// Conversation ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Display name
    pub name: Option<String>,
    /// Favorite flag
    pub is_favorite: bool,
    /// AI chat flag
    pub is_chat_ia: bool,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl From<ConversationRecord> for ConversationResponse {
    fn from(record: ConversationRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            is_favorite: record.is_favorite,
            is_chat_ia: record.is_chat_ia,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response for a completed conversation turn
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    /// The persisted exchange
    pub message: MessageResponse,
    /// The conversation it belongs to
    pub conversation: ConversationResponse,
}

/// AI question routes handler
pub struct AiQuestionRoutes;

impl AiQuestionRoutes {
    /// Create all AI question routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ai-questions/ask", post(Self::ask))
            .route("/api/ai-questions", get(Self::list))
            .route("/api/ai-questions/:id", get(Self::get_by_id))
            .with_state(resources)
    }

    /// Ask the AI tutor a question
    async fn ask(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<AskRequest>,
    ) -> Result<Response, AppError> {
        Self::validate_ask(&request).map_err(|e| e.with_route(ROUTE))?;

        let outcome = chat_orchestration::ask(
            &resources,
            AskParams {
                user_id: request.user_id,
                question: request.question,
                conversation_id: request.conversation_id,
                is_chat_ia: request.is_chat_ia,
                disable_latex: request.disable_latex,
            },
        )
        .await
        .map_err(|e| e.with_route(ROUTE))?;

        let response = AskResponse {
            message: outcome.message.into(),
            conversation: outcome.conversation.into(),
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// List stored exchanges, newest first
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let (limit, offset, page) = query.normalize();
        let manager = resources.database.conversations();

        // Independent reads, joined before responding
        let (messages, total) =
            tokio::try_join!(manager.list_messages(limit, offset), manager.count_messages())
                .map_err(|e| e.with_route(ROUTE))?;

        let items: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();

        Ok((StatusCode::OK, Json(Paged::new(items, total, page, limit))).into_response())
    }

    /// Get one stored exchange by ID
    async fn get_by_id(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let message = resources
            .database
            .conversations()
            .get_message(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("AI question").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(MessageResponse::from(message))).into_response())
    }

    /// Reject malformed ask requests before any side effect
    fn validate_ask(request: &AskRequest) -> Result<(), AppError> {
        require_uuid(&request.user_id, "user_id")?;

        if request.question.trim().chars().count() < 2 {
            return Err(AppError::invalid_input(
                "question must be at least 2 characters",
            ));
        }

        if let Some(conversation_id) = &request.conversation_id {
            require_uuid(conversation_id, "conversation_id")?;
        }

        Ok(())
    }
}
