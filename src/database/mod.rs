// ABOUTME: Database management for all persisted entities
// ABOUTME: Owns the SQLite pool, runs embedded migrations, exposes per-resource managers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # Database Management
//!
//! The [`Database`] newtype owns the SQLite connection pool and creates the
//! schema at startup with embedded `CREATE TABLE IF NOT EXISTS` statements.
//! Per-resource managers ([`ConversationManager`], [`ExerciseManager`],
//! [`StudyGuideManager`], [`ProgressManager`]) borrow the pool and hold the
//! SQL for their tables.

mod conversations;
mod exercises;
mod progress;
mod study_guides;

pub use conversations::{
    ConversationFilter, ConversationManager, ConversationRecord, ConversationSummary,
    MessageRecord,
};
pub use exercises::{
    ExerciseManager, ExerciseRecord, ExerciseUpdate, NewExercise, UserExerciseRecord,
};
pub use progress::{ProgressManager, UserProgressRecord};
pub use study_guides::{NewStudyGuide, StudyGuideManager, StudyGuideRecord, StudyGuideUpdate};

use sqlx::{Pool, Sqlite, SqlitePool};

use crate::errors::AppResult;

/// Database manager for conversations, exercises, guides, and progress
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a schema statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_conversations().await?;
        self.migrate_exercises().await?;
        self.migrate_study_guides().await?;
        self.migrate_progress().await?;
        Ok(())
    }

    /// Lightweight liveness probe used by the health endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Conversation and message operations
    #[must_use]
    pub fn conversations(&self) -> ConversationManager {
        ConversationManager::new(self.pool.clone())
    }

    /// Exercise and user-exercise operations
    #[must_use]
    pub fn exercises(&self) -> ExerciseManager {
        ExerciseManager::new(self.pool.clone())
    }

    /// Study guide operations
    #[must_use]
    pub fn study_guides(&self) -> StudyGuideManager {
        StudyGuideManager::new(self.pool.clone())
    }

    /// User progress operations
    #[must_use]
    pub fn progress(&self) -> ProgressManager {
        ProgressManager::new(self.pool.clone())
    }

    async fn migrate_conversations(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                is_chat_ia INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversations(user_id, updated_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS ai_questions (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_ai_questions_conversation
            ON ai_questions(conversation_id, created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_exercises(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercises (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                difficulty TEXT NOT NULL DEFAULT 'easy',
                content TEXT NOT NULL,
                solution TEXT,
                topic TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_exercises (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                answer TEXT,
                is_correct INTEGER NOT NULL DEFAULT 0,
                answered_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_user_exercises_user
            ON user_exercises(user_id, created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_study_guides(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS study_guides (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                week INTEGER NOT NULL,
                day INTEGER NOT NULL,
                resources TEXT,
                topic TEXT,
                level TEXT NOT NULL DEFAULT 'beginner',
                tags TEXT NOT NULL DEFAULT '[]',
                content TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_progress(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_progress (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                study_guide_id TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_user_progress_user
            ON user_progress(user_id, created_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
