// ABOUTME: Database operations for study guides
// ABOUTME: Plain CRUD with JSON resource/content columns stored as TEXT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::exercises::parse_json_column;
use crate::errors::AppResult;

/// Database representation of a study guide
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyGuideRecord {
    /// Unique study guide ID
    pub id: String,
    /// Guide title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Week of the program this guide belongs to
    pub week: i64,
    /// Day within the week
    pub day: i64,
    /// External resources (videos, links, PDFs)
    pub resources: Option<Value>,
    /// Optional topic label
    pub topic: Option<String>,
    /// Level: beginner, intermediate, or advanced
    pub level: String,
    /// Search tags
    pub tags: Value,
    /// Internal educational content
    pub content: Option<Value>,
    /// When the guide was created (RFC 3339)
    pub created_at: String,
    /// When the guide was last updated (RFC 3339)
    pub updated_at: String,
}

/// Fields for creating a study guide
#[derive(Debug, Clone)]
pub struct NewStudyGuide {
    pub title: String,
    pub description: Option<String>,
    pub week: i64,
    pub day: i64,
    pub resources: Option<Value>,
    pub topic: Option<String>,
    pub level: String,
    pub tags: Value,
    pub content: Option<Value>,
}

/// Partial update of a study guide; unset fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct StudyGuideUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub week: Option<i64>,
    pub day: Option<i64>,
    pub resources: Option<Value>,
    pub topic: Option<String>,
    pub level: Option<String>,
    pub tags: Option<Value>,
    pub content: Option<Value>,
}

/// Study guide database operations
pub struct StudyGuideManager {
    pool: SqlitePool,
}

impl StudyGuideManager {
    /// Create a new study guide manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a study guide
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, new: NewStudyGuide) -> AppResult<StudyGuideRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO study_guides (id, title, description, week, day, resources, topic, level, tags, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ",
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.week)
        .bind(new.day)
        .bind(new.resources.as_ref().map(Value::to_string))
        .bind(&new.topic)
        .bind(&new.level)
        .bind(new.tags.to_string())
        .bind(new.content.as_ref().map(Value::to_string))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(StudyGuideRecord {
            id,
            title: new.title,
            description: new.description,
            week: new.week,
            day: new.day,
            resources: new.resources,
            topic: new.topic,
            level: new.level,
            tags: new.tags,
            content: new.content,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a study guide by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, guide_id: &str) -> AppResult<Option<StudyGuideRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, week, day, resources, topic, level, tags, content, created_at, updated_at
            FROM study_guides
            WHERE id = $1
            ",
        )
        .bind(guide_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    /// List study guides ordered by week, then day
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<StudyGuideRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, week, day, resources, topic, level, tags, content, created_at, updated_at
            FROM study_guides
            ORDER BY week ASC, day ASC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    /// Count all study guides
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM study_guides")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    /// Apply a partial update; returns false if the guide does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(&self, guide_id: &str, update: StudyGuideUpdate) -> AppResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE study_guides
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                week = COALESCE($3, week),
                day = COALESCE($4, day),
                resources = COALESCE($5, resources),
                topic = COALESCE($6, topic),
                level = COALESCE($7, level),
                tags = COALESCE($8, tags),
                content = COALESCE($9, content),
                updated_at = $10
            WHERE id = $11
            ",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.week)
        .bind(update.day)
        .bind(update.resources.as_ref().map(Value::to_string))
        .bind(&update.topic)
        .bind(&update.level)
        .bind(update.tags.as_ref().map(Value::to_string))
        .bind(update.content.as_ref().map(Value::to_string))
        .bind(&now)
        .bind(guide_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a study guide; returns false if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, guide_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM study_guides WHERE id = $1")
            .bind(guide_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn record_from_row(r: &sqlx::sqlite::SqliteRow) -> StudyGuideRecord {
        StudyGuideRecord {
            id: r.get("id"),
            title: r.get("title"),
            description: r.get("description"),
            week: r.get("week"),
            day: r.get("day"),
            resources: parse_json_column(r.get("resources")),
            topic: r.get("topic"),
            level: r.get("level"),
            tags: parse_json_column(r.get("tags")).unwrap_or_else(|| Value::Array(Vec::new())),
            content: parse_json_column(r.get("content")),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}
