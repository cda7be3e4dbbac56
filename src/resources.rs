// ABOUTME: Shared server state constructed once at startup
// ABOUTME: Bundles the database, answer provider, and configuration for handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! Shared server resources.
//!
//! One [`ServerResources`] is built at startup and handed to every route
//! handler behind an `Arc`. Components are constructed from the immutable
//! configuration; tests build the same struct around a temporary database
//! and a stub provider.

use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::AnswerProvider;

/// Everything a request handler needs
pub struct ServerResources {
    /// Persistence for all entities
    pub database: Database,
    /// The never-fails answer facade over the configured LLM backend
    pub answers: AnswerProvider,
    /// Immutable startup configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the shared state
    #[must_use]
    pub const fn new(database: Database, answers: AnswerProvider, config: ServerConfig) -> Self {
        Self {
            database,
            answers,
            config,
        }
    }
}
