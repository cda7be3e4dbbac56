// ABOUTME: Route handlers for user study guide progress
// ABOUTME: Create, list per user, and update completion state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! User progress routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::{require_uuid, PageQuery};
use crate::errors::AppError;
use crate::resources::ServerResources;

/// Route identifier attached to error payloads
const ROUTE: &str = "/api/user-progress";

/// Request body for creating a progress record
#[derive(Debug, Deserialize)]
pub struct CreateProgressRequest {
    pub user_id: String,
    pub study_guide_id: String,
    #[serde(default)]
    pub completed: bool,
}

/// Request body for updating completion state
#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub completed: bool,
}

/// Progress routes handler
pub struct ProgressRoutes;

impl ProgressRoutes {
    /// Create all progress routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/user-progress", post(Self::create))
            .route("/api/user-progress/user/:user_id", get(Self::list_for_user))
            .route("/api/user-progress/:id", put(Self::update))
            .with_state(resources)
    }

    /// Create a progress record for a user and study guide
    async fn create(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<CreateProgressRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&request.user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;
        require_uuid(&request.study_guide_id, "study_guide_id")
            .map_err(|e| e.with_route(ROUTE))?;

        resources
            .database
            .study_guides()
            .get(&request.study_guide_id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Study guide").with_route(ROUTE))?;

        let progress = resources
            .database
            .progress()
            .create(&request.user_id, &request.study_guide_id, request.completed)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::CREATED, Json(progress)).into_response())
    }

    /// List a user's progress records
    async fn list_for_user(
        State(resources): State<Arc<ServerResources>>,
        Path(user_id): Path<String>,
        Query(query): Query<PageQuery>,
    ) -> Result<Response, AppError> {
        require_uuid(&user_id, "user_id").map_err(|e| e.with_route(ROUTE))?;

        let (limit, offset, _) = query.normalize();
        let records = resources
            .database
            .progress()
            .list_for_user(&user_id, limit, offset)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(records)).into_response())
    }

    /// Update the completion state of a progress record
    async fn update(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Json(request): Json<UpdateProgressRequest>,
    ) -> Result<Response, AppError> {
        require_uuid(&id, "id").map_err(|e| e.with_route(ROUTE))?;

        let manager = resources.database.progress();
        let updated = manager
            .set_completed(&id, request.completed)
            .await
            .map_err(|e| e.with_route(ROUTE))?;

        if !updated {
            return Err(AppError::not_found("Progress record").with_route(ROUTE));
        }

        let progress = manager
            .get(&id)
            .await
            .map_err(|e| e.with_route(ROUTE))?
            .ok_or_else(|| AppError::not_found("Progress record").with_route(ROUTE))?;

        Ok((StatusCode::OK, Json(progress)).into_response())
    }
}
