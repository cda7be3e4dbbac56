// ABOUTME: Database operations for per-user study guide progress
// ABOUTME: Tracks completion state with completion timestamps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;

/// One user's progress on one study guide
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgressRecord {
    /// Unique progress record ID
    pub id: String,
    /// User tracked
    pub user_id: String,
    /// Study guide tracked
    pub study_guide_id: String,
    /// Whether the guide is completed
    pub completed: bool,
    /// When the guide was completed (RFC 3339)
    pub completed_at: Option<String>,
    /// When the record was created (RFC 3339)
    pub created_at: String,
    /// When the record was last updated (RFC 3339)
    pub updated_at: String,
}

/// Progress database operations
pub struct ProgressManager {
    pool: SqlitePool,
}

impl ProgressManager {
    /// Create a new progress manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a progress record
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(
        &self,
        user_id: &str,
        study_guide_id: &str,
        completed: bool,
    ) -> AppResult<UserProgressRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let completed_at = completed.then(|| now.clone());

        sqlx::query(
            r"
            INSERT INTO user_progress (id, user_id, study_guide_id, completed, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(study_guide_id)
        .bind(completed)
        .bind(&completed_at)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(UserProgressRecord {
            id,
            user_id: user_id.to_owned(),
            study_guide_id: study_guide_id.to_owned(),
            completed,
            completed_at,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a progress record by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, progress_id: &str) -> AppResult<Option<UserProgressRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, study_guide_id, completed, completed_at, created_at, updated_at
            FROM user_progress
            WHERE id = $1
            ",
        )
        .bind(progress_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    /// List a user's progress records, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<UserProgressRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, study_guide_id, completed, completed_at, created_at, updated_at
            FROM user_progress
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    /// Set the completion flag; stamps `completed_at` on completion and
    /// clears it when un-completing. Returns false if the record is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_completed(&self, progress_id: &str, completed: bool) -> AppResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let completed_at = completed.then(|| now.clone());

        let result = sqlx::query(
            r"
            UPDATE user_progress
            SET completed = $1, completed_at = $2, updated_at = $3
            WHERE id = $4
            ",
        )
        .bind(completed)
        .bind(&completed_at)
        .bind(&now)
        .bind(progress_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn record_from_row(r: &sqlx::sqlite::SqliteRow) -> UserProgressRecord {
        UserProgressRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            study_guide_id: r.get("study_guide_id"),
            completed: r.get("completed"),
            completed_at: r.get("completed_at"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
