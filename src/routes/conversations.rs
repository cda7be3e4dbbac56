// ABOUTME: Route handlers for conversation management
// ABOUTME: Listing with filters, history, rename, favorite toggle, delete, generate-name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Conversation routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::ai_questions::{ConversationResponse, MessageResponse};
use super::{require_uuid, Paged};
use crate::database::{ConversationFilter, ConversationSummary};
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::{chat_orchestration, naming};

/// Route identifier attached to error payloads
const ROUTE: &str = "/api/conversations";

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    20
}

/// Query parameters for listing a user's conversations
#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Only return favorites
    #[serde(default)]
    pub favorites_only: bool,
    /// Case-insensitive name search
    #[serde(default)]
    pub search: Option<String>,
}

/// Query parameters for fetching one conversation
#[derive(Debug, Deserialize)]
pub struct GetConversationQuery {
    /// Include the ordered message list (default true)
    #[serde(default = "default_include_messages")]
    pub include_messages: bool,
}

const fn default_include_messages() -> bool {
    true
}

/// Request body for creating a conversation explicitly
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// Owning user
    pub user_id: String,
    /// Optional display name (1-255 characters)
    #[serde(default)]
    pub name: Option<String>,
    /// Favorite flag
    #[serde(default)]
    pub is_favorite: bool,
    /// AI chat flag
    #[serde(default)]
    pub is_chat_ia: bool,
}

/// Request body for renaming a conversation
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// The new display name
    pub name: String,
}

/// Request body for the favorite toggle
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    /// New favorite state
    pub is_favorite: bool,
}

/// Conversation plus its ordered history
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationHistoryResponse {
    /// The conversation
    pub conversation: ConversationResponse,
    /// Messages in chronological order (omitted when not requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageResponse>>,
}

/// Response of the generate-name endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedNameResponse {
    /// The generated name
    pub name: String,
    /// The updated conversation
    pub conversation: ConversationResponse,
}

/// Conversation routes handler
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create all conversation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/conversations/user/:user_id",
                get(Self::list_for_user),
            )
            .route("/api/conversations/:id", get(Self::get_conversation))
            .route("/api/conversations", post(Self::create_conversation))
            .route("/api/conversations/:id/name", put(Self::rename))
            .route("/api/conversations/:id/favorite", put(Self::toggle_favorite))
            .route("/api/conversations/:id", delete(Self::delete_conversation))
            .route(
                "/api/conversations/:id/generate-name",
                post(Self::generate_name),
            )
            .with_state(resources)
    }

    /// List a user's conversations with paging and filters
    ///
    /// An empty page is a normal response, not an error.
    async fn list_for_user(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        Query(query): Query<ListConversationsQuery>,
    ) -> Result<Response, AppError> {
        require_uuid(&user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let offset = (page - 1) * limit;
        let filter = ConversationFilter {
            favorites_only: query.favorites_only,
            search: query.search.clone(),
        };

        let manager = resources.database.conversations();

        // The page and its total count are independent reads
        let (summaries, total): (Vec<ConversationSummary>, i64) = tokio::try_join!(
            manager.list_for_user(&user_id, &filter, limit, offset),
            manager.count_for_user(&user_id, &filter),
        )
        .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(Paged::new(summaries, total, page, limit))).into_response())
    }

    /// Get one conversation, with its ordered messages by default
    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Query(query): Query<GetConversationQuery>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let manager = resources.database.conversations();

        let (conversation, messages) =
            tokio::try_join!(manager.get(&id), manager.get_messages(&id))
                .map_err(|e| e.with_route(ROUTE))?;

        let conversation =
            conversation.ok_or_else(|| AppError::not_found("Conversation").with_route(ROUTE))?;

        let response = ConversationHistoryResponse {
            conversation: conversation.into(),
            messages: query
                .include_messages
                .then(|| messages.into_iter().map(Into::into).collect()),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Create a conversation explicitly
    async fn create_conversation(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CreateConversationRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&request.user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;

        if let Some(name) = &request.name {
            if !naming::validate_name(name) {
                return Err(AppError::invalid_input("name must be 1-255 characters")
                    .with_route(ROUTE));
            }
        }

        let manager = resources.database.conversations();
        let conversation = manager
            .create(
                &request.user_id,
                request.name.as_deref().map(str::trim),
                request.is_chat_ia,
            )
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        let conversation = if request.is_favorite {
            manager
                .set_favorite(&conversation.id, true)
                .await
                .map_err(|e| e.with_route(ROUTE))?;
            manager
                .get(&conversation.id)
                .await
                .map_err(|e| e.with_route(ROUTE))?
                .unwrap_or(conversation)
        } else {
            conversation
        };

        Ok((
            StatusCode::CREATED,
            Json(ConversationResponse::from(conversation)),
        )
            .into_response())
    }

    /// Rename a conversation
    async fn rename(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Json(request): Json<RenameRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        if !naming::validate_name(&request.name) {
            return Err(AppError::invalid_input("name must be 1-255 characters").with_route(ROUTE));
        }

        let manager = resources.database.conversations();
        let updated = manager
            .update_name(&id, request.name.trim())
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !updated {
            return Err(AppError::not_found("Conversation").with_route(ROUTE));
        }

        let conversation = manager
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Conversation").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(ConversationResponse::from(conversation))).into_response())
    }

    /// Set or clear the favorite flag
    async fn toggle_favorite(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Json(request): Json<FavoriteRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let manager = resources.database.conversations();
        let updated = manager
            .set_favorite(&id, request.is_favorite)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !updated {
            return Err(AppError::not_found("Conversation").with_route(ROUTE));
        }

        let conversation = manager
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Conversation").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(ConversationResponse::from(conversation))).into_response())
    }

    /// Delete a conversation and all of its messages
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let deleted = resources
            .database
            .conversations()
            .delete(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !deleted {
            return Err(AppError::not_found("Conversation").with_route(ROUTE));
        }

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Conversation deleted"})),
        )
            .into_response())
    }

    /// Generate a fresh name from the conversation's first message
    async fn generate_name(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let (name, conversation) =
            chat_orchestration::generate_conversation_name(&resources, &id)
                .await
                .map_err(|e| e.with_route(ROUTE))?;

        let response = GeneratedNameResponse {
            name,
            conversation: conversation.into(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
