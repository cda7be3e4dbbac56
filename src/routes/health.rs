// ABOUTME: Liveness endpoint with a database reachability probe
// ABOUTME: Reports service metadata and the configured provider backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Health routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::resources::ServerResources;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Service version
    pub version: String,
    /// Database reachability: "up" or "down"
    pub database: String,
    /// Configured LLM backend name
    pub provider: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    /// Liveness plus a database ping
    async fn health(State(resources): State<Arc<ServerResources>>) -> Response {
        let database_up = resources.database.ping().await.is_ok();

        let response = HealthResponse {
            status: if database_up { "healthy" } else { "degraded" }.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            database: if database_up { "up" } else { "down" }.to_owned(),
            provider: resources.answers.provider_name().to_owned(),
        };

        let status = if database_up {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (status, Json(response)).into_response()
    }
}
