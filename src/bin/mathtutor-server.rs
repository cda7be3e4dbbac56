// ABOUTME: Server binary wiring configuration, database, provider, and routes
// ABOUTME: Binds the REST API and serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MathTutor Backend Contributors

//! # MathTutor Server Binary
//!
//! Starts the math-tutoring REST backend: loads configuration from the
//! environment, opens the database, constructs the LLM answer provider,
//! and serves the API.

use anyhow::Result;
use clap::Parser;
use mathtutor_server::{
    config::ServerConfig, database::Database, llm::AnswerProvider, logging,
    resources::ServerResources, routes,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "mathtutor-server")]
#[command(about = "Math tutoring backend with an AI tutor chat")]
pub struct Args {
    /// Override the HTTP port from configuration
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting MathTutor server");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized: {}", config.database_url);

    let answers = AnswerProvider::from_config(&config.llm)?;
    info!("Answer provider ready: {}", answers.provider_name());

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(database, answers, config));
    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Listening on port {http_port}");
    display_available_endpoints(http_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve when the process receives a termination signal
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

/// Display all available API endpoints
fn display_available_endpoints(port: u16) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    info!("AI Tutor:");
    info!("   Ask:               POST http://{host}:{port}/api/ai-questions/ask");
    info!("   Question Records:  GET  http://{host}:{port}/api/ai-questions");
    info!("Conversations:");
    info!("   List for User:     GET  http://{host}:{port}/api/conversations/user/{{user_id}}");
    info!("   History:           GET  http://{host}:{port}/api/conversations/{{id}}");
    info!("   Rename:            PUT  http://{host}:{port}/api/conversations/{{id}}/name");
    info!("   Favorite:          PUT  http://{host}:{port}/api/conversations/{{id}}/favorite");
    info!("   Delete:            DELETE http://{host}:{port}/api/conversations/{{id}}");
    info!("   Generate Name:     POST http://{host}:{port}/api/conversations/{{id}}/generate-name");
    info!("Content:");
    info!("   Exercises:         CRUD http://{host}:{port}/api/exercises");
    info!("   User Exercises:    POST http://{host}:{port}/api/user-exercises");
    info!("   Study Guides:      CRUD http://{host}:{port}/api/study-guides");
    info!("   User Progress:     CRUD http://{host}:{port}/api/user-progress");
    info!("Monitoring:");
    info!("   Health Check:      GET  http://{host}:{port}/health");
    info!("=== End of Endpoint List ===");
}
