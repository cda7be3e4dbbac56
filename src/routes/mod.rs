// ABOUTME: REST API route assembly and shared request/response plumbing
// ABOUTME: Pagination envelope and id validation used by every resource module
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! HTTP routes for the REST API.
//!
//! Each resource gets its own module with a `Routes` struct in the style of
//! `ExerciseRoutes::routes(resources)`; this module merges them into the
//! full application router and holds the small shared pieces: the paged
//! response envelope and UUID path validation.

pub mod ai_questions;
pub mod conversations;
pub mod exercises;
pub mod health;
pub mod progress;
pub mod study_guides;

use std::sync::Arc;

use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;

/// Hard cap on page sizes
const MAX_PAGE_SIZE: i64 = 100;

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    20
}

/// Common `page`/`limit` query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page (capped at 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Normalize into `(limit, offset, page)` with bounds applied
    #[must_use]
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        (limit, (page - 1) * limit, page)
    }
}

/// Pagination metadata attached to every paged response
#[derive(Debug, Serialize, Deserialize)]
pub struct PageMeta {
    /// Total matching items across all pages
    pub total_items: i64,
    /// Total number of pages
    pub total_pages: i64,
    /// The page returned
    pub current_page: i64,
    /// Page size used
    pub per_page: i64,
}

/// Paged response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct Paged<T> {
    /// The items of this page
    pub items: Vec<T>,
    /// Pagination metadata
    pub meta: PageMeta,
}

impl<T> Paged<T> {
    /// Assemble a page from items and the overall count
    #[must_use]
    pub fn new(items: Vec<T>, total_items: i64, page: i64, per_page: i64) -> Self {
        Self {
            items,
            meta: PageMeta {
                total_items,
                total_pages: (total_items + per_page - 1) / per_page,
                current_page: page,
                per_page,
            },
        }
    }
}

/// Validate that a path/body id is a well-formed UUID
///
/// # Errors
///
/// Returns an `InvalidInput` error naming the offending field.
pub fn require_uuid(value: &str, field: &str) -> AppResult<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| AppError::invalid_input(format!("{field} must be a valid UUID")))
}

/// Build the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(health::HealthRoutes::routes(resources.clone()))
        .merge(ai_questions::AiQuestionRoutes::routes(resources.clone()))
        .merge(conversations::ConversationRoutes::routes(resources.clone()))
        .merge(exercises::ExerciseRoutes::routes(resources.clone()))
        .merge(study_guides::StudyGuideRoutes::routes(resources.clone()))
        .merge(progress::ProgressRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_normalize() {
        let (limit, offset, page) = PageQuery { page: 3, limit: 10 }.normalize();
        assert_eq!((limit, offset, page), (10, 20, 3));

        // Out-of-range values are clamped
        let (limit, offset, page) = PageQuery { page: 0, limit: 9999 }.normalize();
        assert_eq!((limit, offset, page), (MAX_PAGE_SIZE, 0, 1));
    }

    #[test]
    fn test_paged_meta() {
        let page = Paged::new(vec![1, 2, 3], 7, 1, 3);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.total_items, 7);

        let empty: Paged<i32> = Paged::new(Vec::new(), 0, 1, 20);
        assert_eq!(empty.meta.total_pages, 0);
    }

    #[test]
    fn test_require_uuid() {
        assert!(require_uuid("550e8400-e29b-41d4-a716-446655440000", "id").is_ok());
        let err = require_uuid("nope", "user_id").unwrap_err();
        assert!(err.message.contains("user_id"));
    }
}
