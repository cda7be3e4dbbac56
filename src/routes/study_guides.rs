// ABOUTME: Route handlers for study guides
// ABOUTME: Plain CRUD ordered by program week and day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Study guide routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;

use super::{require_uuid, PageQuery, Paged};
use crate::database::{NewStudyGuide, StudyGuideUpdate};
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Route identifier attached to error payloads
const ROUTE: &str = "/api/study-guides";

/// Accepted level labels
const LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// Request body for creating a study guide
#[derive(Debug, Deserialize)]
pub struct CreateStudyGuideRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub week: i64,
    pub day: i64,
    #[serde(default)]
    pub resources: Option<Value>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// Request body for a partial study guide update
#[derive(Debug, Deserialize)]
pub struct UpdateStudyGuideRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub week: Option<i64>,
    #[serde(default)]
    pub day: Option<i64>,
    #[serde(default)]
    pub resources: Option<Value>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// Study guide routes handler
pub struct StudyGuideRoutes;

impl StudyGuideRoutes {
    /// Create all study guide routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/study-guides", post(Self::create))
            .route("/api/study-guides", get(Self::list))
            .route("/api/study-guides/:id", get(Self::get_by_id))
            .route("/api/study-guides/:id", put(Self::update))
            .route("/api/study-guides/:id", delete(Self::delete))
            .with_state(resources)
    }

    /// Create a study guide
    async fn create(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CreateStudyGuideRequest>,
    ) -> Result<Response, AppError> {
        let level = request.level.unwrap_or_else(|| "beginner".to_owned());
        Self::validate_level(&level).map_err(|e| e.with_route(ROUTE))?;
        Self::validate_schedule(request.week, request.day).map_err(|e| e.with_route(ROUTE))?;

        let guide = resources
            .database
            .study_guides()
            .create(NewStudyGuide {
                title: request.title.trim().to_owned(),
                description: request.description,
                week: request.week,
                day: request.day,
                resources: request.resources,
                topic: request.topic,
                level,
                tags: request.tags.unwrap_or_else(|| Value::Array(Vec::new())),
                content: request.content,
            })
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::CREATED, Json(guide)).into_response())
    }

    /// List study guides in program order
    async fn list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        let (limit, offset, page) = query.normalize();
        let manager = resources.database.study_guides();

        let (guides, total) = tokio::try_join!(manager.list(limit, offset), manager.count())
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(Paged::new(guides, total, page, limit))).into_response())
    }

    /// Get one study guide by ID
    async fn get_by_id(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let guide = resources
            .database
            .study_guides()
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Study guide").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(guide)).into_response())
    }

    /// Partially update a study guide
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Json(request): Json<UpdateStudyGuideRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        if let Some(level) = &request.level {
            Self::validate_level(level).map_err(|e| e.with_route(ROUTE))?;
        }

        let manager = resources.database.study_guides();
        let updated = manager
            .update(
                &id,
                StudyGuideUpdate {
                    title: request.title,
                    description: request.description,
                    week: request.week,
                    day: request.day,
                    resources: request.resources,
                    topic: request.topic,
                    level: request.level,
                    tags: request.tags,
                    content: request.content,
                },
            )
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !updated {
            return Err(AppError::not_found("Study guide").with_route(ROUTE));
        }

        let guide = manager
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Study guide").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(guide)).into_response())
    }

    /// Delete a study guide
    async fn delete(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let deleted = resources
            .database
            .study_guides()
            .delete(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !deleted {
            return Err(AppError::not_found("Study guide").with_route(ROUTE));
        }

        Ok((
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Study guide deleted"})),
        )
            .into_response())
    }

    fn validate_level(level: &str) -> Result<(), AppError> {
        if LEVELS.contains(&level) {
            Ok(())
        } else {
            Err(AppError::invalid_input(
                "level must be one of: beginner, intermediate, advanced",
            ))
        }
    }

    fn validate_schedule(week: i64, day: i64) -> Result<(), AppError> {
        if week < 1 || day < 1 {
            return Err(AppError::invalid_input("week and day must be positive"));
        }
        Ok(())
    }
}
