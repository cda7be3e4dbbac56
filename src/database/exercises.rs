// ABOUTME: Database operations for exercises and user exercise attempts
// ABOUTME: Plain CRUD with JSON content columns stored as TEXT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;

/// Database representation of an exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseRecord {
    /// Unique exercise ID
    pub id: String,
    /// Exercise title
    pub title: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Difficulty: easy, medium, or hard
    pub difficulty: String,
    /// Exercise content (problem statement, choices, etc.)
    pub content: Value,
    /// Optional worked solution
    pub solution: Option<Value>,
    /// Optional topic label
    pub topic: Option<String>,
    /// Search tags
    pub tags: Value,
    /// When the exercise was created (RFC 3339)
    pub created_at: String,
    /// When the exercise was last updated (RFC 3339)
    pub updated_at: String,
}

/// One user's recorded attempt at an exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserExerciseRecord {
    /// Unique attempt ID
    pub id: String,
    /// User who answered
    pub user_id: String,
    /// Exercise answered
    pub exercise_id: String,
    /// The submitted answer
    pub answer: Option<Value>,
    /// Whether the answer was correct
    pub is_correct: bool,
    /// When the answer was submitted (RFC 3339)
    pub answered_at: Option<String>,
    /// When the record was created (RFC 3339)
    pub created_at: String,
}

/// Fields for creating an exercise
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub title: String,
    pub description: Option<String>,
    pub difficulty: String,
    pub content: Value,
    pub solution: Option<Value>,
    pub topic: Option<String>,
    pub tags: Value,
}

/// Partial update of an exercise; unset fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct ExerciseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub content: Option<Value>,
    pub solution: Option<Value>,
    pub topic: Option<String>,
    pub tags: Option<Value>,
}

/// Exercise database operations
pub struct ExerciseManager {
    pool: SqlitePool,
}

impl ExerciseManager {
    /// Create a new exercise manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an exercise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create(&self, new: NewExercise) -> AppResult<ExerciseRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO exercises (id, title, description, difficulty, content, solution, topic, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ",
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.difficulty)
        .bind(new.content.to_string())
        .bind(new.solution.as_ref().map(Value::to_string))
        .bind(&new.topic)
        .bind(new.tags.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ExerciseRecord {
            id,
            title: new.title,
            description: new.description,
            difficulty: new.difficulty,
            content: new.content,
            solution: new.solution,
            topic: new.topic,
            tags: new.tags,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get an exercise by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get(&self, exercise_id: &str) -> AppResult<Option<ExerciseRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, difficulty, content, solution, topic, tags, created_at, updated_at
            FROM exercises
            WHERE id = $1
            ",
        )
        .bind(exercise_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    /// List exercises, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<ExerciseRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, difficulty, content, solution, topic, tags, created_at, updated_at
            FROM exercises
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::record_from_row).collect())
    }

    /// Count all exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn count(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM exercises")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    /// Apply a partial update; returns false if the exercise does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update(&self, exercise_id: &str, update: ExerciseUpdate) -> AppResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r"
            UPDATE exercises
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                difficulty = COALESCE($3, difficulty),
                content = COALESCE($4, content),
                solution = COALESCE($5, solution),
                topic = COALESCE($6, topic),
                tags = COALESCE($7, tags),
                updated_at = $8
            WHERE id = $9
            ",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.difficulty)
        .bind(update.content.as_ref().map(Value::to_string))
        .bind(update.solution.as_ref().map(Value::to_string))
        .bind(&update.topic)
        .bind(update.tags.as_ref().map(Value::to_string))
        .bind(&now)
        .bind(exercise_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an exercise; returns false if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete(&self, exercise_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(exercise_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // User Attempts
    // ========================================================================

    /// Record a user's attempt at an exercise
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn record_attempt(
        &self,
        user_id: &str,
        exercise_id: &str,
        answer: Option<&Value>,
        is_correct: bool,
    ) -> AppResult<UserExerciseRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO user_exercises (id, user_id, exercise_id, answer, is_correct, answered_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(exercise_id)
        .bind(answer.map(Value::to_string))
        .bind(is_correct)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(UserExerciseRecord {
            id,
            user_id: user_id.to_owned(),
            exercise_id: exercise_id.to_owned(),
            answer: answer.cloned(),
            is_correct,
            answered_at: Some(now.clone()),
            created_at: now,
        })
    }

    /// List a user's attempts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_attempts_for_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<UserExerciseRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, exercise_id, answer, is_correct, answered_at, created_at
            FROM user_exercises
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

        let attempts = rows
            .into_iter()
            .map(|r| UserExerciseRecord {
                id: r.get("id"),
                user_id: r.get("user_id"),
                exercise_id: r.get("exercise_id"),
                answer: parse_json_column(r.get("answer")),
                is_correct: r.get("is_correct"),
                answered_at: r.get("answered_at"),
                created_at: r.get("created_at"),
            })
            .collect();

        Ok(attempts)
    }

    fn record_from_row(r: &sqlx::sqlite::SqliteRow) -> ExerciseRecord {
        ExerciseRecord {
            id: r.get("id"),
            title: r.get("title"),
            description: r.get("description"),
            difficulty: r.get("difficulty"),
            content: parse_json_column(r.get("content")).unwrap_or(Value::Null),
            solution: parse_json_column(r.get("solution")),
            topic: r.get("topic"),
            tags: parse_json_column(r.get("tags")).unwrap_or_else(|| Value::Array(Vec::new())),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }
}

/// Parse a nullable TEXT column holding serialized JSON
pub(crate) fn parse_json_column(raw: Option<String>) -> Option<Value> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}
