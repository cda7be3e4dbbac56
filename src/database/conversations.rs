// ABOUTME: Database operations for AI tutor conversations and their messages
// ABOUTME: CRUD with pagination, favorite/search filters, and cascade deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// User ID who owns the conversation
    pub user_id: String,
    /// Display name (unset until the first exchange names it)
    pub name: Option<String>,
    /// Whether the user marked this conversation as favorite
    pub is_favorite: bool,
    /// Whether this is an AI tutor chat (vs. another conversation type)
    pub is_chat_ia: bool,
    /// When the conversation was created (RFC 3339)
    pub created_at: String,
    /// When the conversation was last updated (RFC 3339)
    pub updated_at: String,
}

/// Database representation of one question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// The user's question
    pub question: String,
    /// The assistant's answer (null until the provider responded)
    pub answer: Option<String>,
    /// When the message was created (RFC 3339)
    pub created_at: String,
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Favorite flag
    pub is_favorite: bool,
    /// AI chat flag
    pub is_chat_ia: bool,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// Most recent question, as preview text
    pub preview: Option<String>,
    /// When the conversation was created
    pub created_at: String,
    /// When the conversation was last updated
    pub updated_at: String,
}

/// Filters for listing a user's conversations
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    /// Only favorites
    pub favorites_only: bool,
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
}

// ============================================================================
// Conversation Manager
// ============================================================================

/// Conversation and message database operations
pub struct ConversationManager {
    pool: SqlitePool,
}

impl ConversationManager {
    /// Create a new conversation manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Create a new conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(
        &self,
        user_id: &str,
        name: Option<&str>,
        is_chat_ia: bool,
    ) -> AppResult<ConversationRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO conversations (id, user_id, name, is_favorite, is_chat_ia, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $5, $5)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(is_chat_ia)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ConversationRecord {
            id,
            user_id: user_id.to_owned(),
            name: name.map(ToOwned::to_owned),
            is_favorite: false,
            is_chat_ia,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, conversation_id: &str) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, is_favorite, is_chat_ia, created_at, updated_at
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::record_from_row(&r)))
    }

    /// List a user's conversations, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_user(
        &self,
        user_id: &str,
        filter: &ConversationFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let rows = sqlx::query(
            r"
            SELECT c.id, c.name, c.is_favorite, c.is_chat_ia, c.created_at, c.updated_at,
                   COUNT(m.id) AS message_count,
                   (SELECT question FROM ai_questions
                    WHERE conversation_id = c.id
                    ORDER BY created_at DESC LIMIT 1) AS preview
            FROM conversations c
            LEFT JOIN ai_questions m ON m.conversation_id = c.id
            WHERE c.user_id = $1
              AND ($2 = 0 OR c.is_favorite = 1)
              AND ($3 IS NULL OR LOWER(COALESCE(c.name, '')) LIKE $3)
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(user_id)
        .bind(i64::from(filter.favorites_only))
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let summaries = rows
            .into_iter()
            .map(|r| ConversationSummary {
                id: r.get("id"),
                name: r.get("name"),
                is_favorite: r.get("is_favorite"),
                is_chat_ia: r.get("is_chat_ia"),
                message_count: r.get("message_count"),
                preview: r.get("preview"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })
            .collect();

        Ok(summaries)
    }

    /// Count a user's conversations under the same filters as `list_for_user`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count_for_user(
        &self,
        user_id: &str,
        filter: &ConversationFilter,
    ) -> AppResult<i64> {
        let search = filter
            .search
            .as_deref()
            .map(|s| format!("%{}%", s.to_lowercase()));

        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS count
            FROM conversations c
            WHERE c.user_id = $1
              AND ($2 = 0 OR c.is_favorite = 1)
              AND ($3 IS NULL OR LOWER(COALESCE(c.name, '')) LIKE $3)
            ",
        )
        .bind(user_id)
        .bind(i64::from(filter.favorites_only))
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    /// Update a conversation's display name
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_name(&self, conversation_id: &str, name: &str) -> AppResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE conversations
            SET name = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(name)
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set or clear the favorite flag
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_favorite(&self, conversation_id: &str, is_favorite: bool) -> AppResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE conversations
            SET is_favorite = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(is_favorite)
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a conversation and all of its messages
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, conversation_id: &str) -> AppResult<bool> {
        // Messages first, then the conversation row
        sqlx::query("DELETE FROM ai_questions WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Add a question/answer exchange and bump the conversation timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn add_message(
        &self,
        conversation_id: &str,
        question: &str,
        answer: Option<&str>,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO ai_questions (id, conversation_id, question, answer, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(question)
        .bind(answer)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            UPDATE conversations
            SET updated_at = $1
            WHERE id = $2
            ",
        )
        .bind(&now)
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            question: question.to_owned(),
            answer: answer.map(ToOwned::to_owned),
            created_at: now,
        })
    }

    /// Get all messages for a conversation in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, question, answer, created_at
            FROM ai_questions
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::message_from_row).collect())
    }

    /// Get the most recent N messages in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, question, answer, created_at
            FROM ai_questions
            WHERE conversation_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Reverse to get chronological order
        let mut messages: Vec<MessageRecord> = rows.iter().map(Self::message_from_row).collect();
        messages.reverse();

        Ok(messages)
    }

    /// Get a single message by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_message(&self, message_id: &str) -> AppResult<Option<MessageRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, conversation_id, question, answer, created_at
            FROM ai_questions
            WHERE id = $1
            ",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::message_from_row))
    }

    /// List all messages across conversations, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_messages(&self, limit: i64, offset: i64) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, question, answer, created_at
            FROM ai_questions
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::message_from_row).collect())
    }

    /// Count all stored messages across conversations
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count_messages(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM ai_questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    /// Get the first message of a conversation, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn first_message(&self, conversation_id: &str) -> AppResult<Option<MessageRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, conversation_id, question, answer, created_at
            FROM ai_questions
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::message_from_row))
    }

    /// Get the message count for a conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn message_count(&self, conversation_id: &str) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS count
            FROM ai_questions
            WHERE conversation_id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    fn record_from_row(r: &sqlx::sqlite::SqliteRow) -> ConversationRecord {
        ConversationRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            name: r.get("name"),
            is_favorite: r.get("is_favorite"),
            is_chat_ia: r.get("is_chat_ia"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    fn message_from_row(r: &sqlx::sqlite::SqliteRow) -> MessageRecord {
        MessageRecord {
            id: r.get("id"),
            conversation_id: r.get("conversation_id"),
            question: r.get("question"),
            answer: r.get("answer"),
            created_at: r.get("created_at"),
        }
    }
}
