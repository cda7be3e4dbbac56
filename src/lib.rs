// ABOUTME: Main library entry point for the math tutoring backend
// ABOUTME: Exposes the REST API surface, persistence layer, and LLM integration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

#![deny(unsafe_code)]

//! # MathTutor Server
//!
//! A REST backend for a math-tutoring application. It stores exercises,
//! study guides, user progress, and AI-tutor conversation transcripts, and
//! proxies chat requests to an external LLM provider (a hosted
//! chat-completion API or a local model runner).
//!
//! ## Architecture
//!
//! - **Routes**: Axum handlers, one module per resource
//! - **Services**: conversation-turn orchestration and conversation naming
//! - **LLM**: provider abstraction with token-budget prompt clamping
//! - **Database**: SQLite persistence via sqlx with embedded migrations
//! - **Formatters**: math-notation post-processing of provider answers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mathtutor_server::config::ServerConfig;
//!
//! let config = ServerConfig::from_env();
//! println!("MathTutor server configured for port {}", config.http_port);
//! ```

/// Configuration management (environment-sourced, immutable after startup)
pub mod config;

/// Database management for all persisted entities
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Math-notation output formatting for provider answers
pub mod formatters;

/// LLM provider abstraction for the AI tutor
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Shared server state handed to every route handler
pub mod resources;

/// HTTP routes for the REST API
pub mod routes;

/// Domain service layer (conversation turns, conversation naming)
pub mod services;
