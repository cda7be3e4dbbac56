// ABOUTME: Route handlers for exercises and user exercise attempts
// ABOUTME: Plain CRUD over the exercise store plus attempt recording
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Exercise routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::{require_uuid, PageQuery, Paged};
use crate::database::{ExerciseUpdate, NewExercise};
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Route identifier attached to error payloads
const ROUTE: &str = "/api/exercises";

/// Accepted difficulty labels
const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

/// Request body for creating an exercise
#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub content: Value,
    #[serde(default)]
    pub solution: Option<Value>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tags: Option<Value>,
}

/// Request body for a partial exercise update
#[derive(Debug, Deserialize)]
pub struct UpdateExerciseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub solution: Option<Value>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub tags: Option<Value>,
}

/// Request body for recording an attempt
#[derive(Debug, Deserialize)]
pub struct RecordAttemptRequest {
    pub user_id: String,
    pub exercise_id: String,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub is_correct: bool,
}

/// Exercise routes handler
pub struct ExerciseRoutes;

impl ExerciseRoutes {
    /// Create all exercise routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/exercises", post(Self::create))
            .route("/api/exercises", get(Self::list))
            .route("/api/exercises/:id", get(Self::get_by_id))
            .route("/api/exercises/:id", put(Self::update))
            .route("/api/exercises/:id", delete(Self::delete))
            .route("/api/user-exercises", post(Self::record_attempt))
            .route(
                "/api/user-exercises/user/:user_id",
                get(Self::list_attempts),
            )
            .with_state(resources)
    }

    /// Create an exercise
    async fn create(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CreateExerciseRequest>,
    ) -> Result<Response, AppError> {
        let difficulty = request.difficulty.unwrap_or_else(|| "easy".to_owned());
        Self::validate_title(&request.title).map_err(|e| e.with_route(ROUTE))?;
        Self::validate_difficulty(&difficulty).map_err(|e| e.with_route(ROUTE))?;

        let exercise = resources
            .database
            .exercises()
            .create(NewExercise {
                title: request.title.trim().to_owned(),
                description: request.description,
                difficulty,
                content: request.content,
                solution: request.solution,
                topic: request.topic,
                tags: request.tags.unwrap_or_else(|| Value::Array(Vec::new())),
            })
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::CREATED, Json(exercise)).into_response())
    }

    /// List exercises
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let (limit, offset, page) = query.normalize();
        let manager = resources.database.exercises();

        let (exercises, total) = tokio::try_join!(manager.list(limit, offset), manager.count())
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(Paged::new(exercises, total, page, limit))).into_response())
    }

    /// Get one exercise by ID
    async fn get_by_id(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let exercise = resources
            .database
            .exercises()
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Exercise").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(exercise)).into_response())
    }

    /// Partially update an exercise
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Json(request): Json<UpdateExerciseRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        if let Some(title) = &request.title {
            Self::validate_title(title).map_err(|e| e.with_route(ROUTE))?;
        }
        if let Some(difficulty) = &request.difficulty {
            Self::validate_difficulty(difficulty).map_err(|e| e.with_route(ROUTE))?;
        }

        let manager = resources.database.exercises();
        let updated = manager
            .update(
                &id,
                ExerciseUpdate {
                    title: request.title,
                    description: request.description,
                    difficulty: request.difficulty,
                    content: request.content,
                    solution: request.solution,
                    topic: request.topic,
                    tags: request.tags,
                },
            )
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !updated {
            return Err(AppError::not_found("Exercise").with_route(ROUTE));
        }

        let exercise = manager
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Exercise").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(exercise)).into_response())
    }

    /// Delete an exercise
    async fn delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let deleted = resources
            .database
            .exercises()
            .delete(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !deleted {
            return Err(AppError::not_found("Exercise").with_route(ROUTE));
        }

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Exercise deleted"})),
        )
            .into_response())
    }

    /// Record a user's attempt at an exercise
    async fn record_attempt(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RecordAttemptRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&request.user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;
        require_uuid(&request.exercise_id, "exercise_id").map_err(|e| e.with_route(ROUTE))?;

        let manager = resources.database.exercises();

        manager
            .get(&request.exercise_id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Exercise").with_route(ROUTE))?;

        let attempt = manager
            .record_attempt(
                &request.user_id,
                &request.exercise_id,
                request.answer.as_ref(),
                request.is_correct,
            )
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::CREATED, Json(attempt)).into_response())
    }

    /// List a user's attempts
    async fn list_attempts(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        require_uuid(&user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;

        let (limit, offset, _) = query.normalize();
        let attempts = resources
            .database
            .exercises()
            .list_attempts_for_user(&user_id, limit, offset)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(attempts)).into_response())
    }

    fn validate_title(title: &str) -> Result<(), AppError> {
        let len = title.trim().chars().count();
        if (1..=255).contains(&len) {
            Ok(())
        } else {
            Err(AppError::invalid_input("title must be 1-255 characters"))
        }
    }

    fn validate_difficulty(difficulty: &str) -> Result<(), AppError> {
        if DIFFICULTIES.contains(&difficulty) {
            Ok(())
        } else {
            Err(AppError::invalid_input(
                "difficulty must be one of: easy, medium, hard",
            ))
        }
    }
}
