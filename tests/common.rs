// ABOUTME: Shared setup for integration tests
// ABOUTME: Temporary SQLite database, scripted stub provider, and router assembly

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use tempfile::TempDir;

use mathtutor_server::config::{
    LlmBackend, LlmConfig, NamingMode, OllamaConfig, OpenRouterConfig, ServerConfig,
};
use mathtutor_server::database::Database;
use mathtutor_server::errors::AppError;
use mathtutor_server::llm::{
    AnswerProvider, ChatRequest, ChatResponse, ChatStream, LlmCapabilities, LlmProvider,
    StreamChunk,
};
use mathtutor_server::resources::ServerResources;
use mathtutor_server::routes;

/// Scripted behavior for the stub LLM provider
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Always answer with this text
    Reply(String),
    /// Answer with an empty string
    Empty,
    /// Fail with an external-service error
    Fail,
}

/// Stub provider that records every request it receives
pub struct StubProvider {
    behavior: StubBehavior,
    requests: Mutex<Vec<ChatRequest>>,
}

impl StubProvider {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests dispatched to this provider, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn display_name(&self) -> &'static str {
        "Stub"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::text_only()
    }

    fn default_model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.behavior {
            StubBehavior::Reply(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "stub-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            StubBehavior::Empty => Ok(ChatResponse {
                content: String::new(),
                model: "stub-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            StubBehavior::Fail => Err(AppError::external_service("stub", "scripted failure")),
        }
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let response = self.complete(request).await?;
        Ok(Box::pin(stream::iter(vec![Ok(StreamChunk {
            delta: response.content,
            is_final: true,
            finish_reason: response.finish_reason,
        })])))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

/// Everything a test needs to drive the API in-process
pub struct TestContext {
    pub router: axum::Router,
    pub resources: Arc<ServerResources>,
    pub stub: Arc<StubProvider>,
    // Keeps the SQLite file alive for the duration of the test
    _tempdir: TempDir,
}

/// Build a server around a temporary database and a scripted provider
pub async fn create_test_context(behavior: StubBehavior) -> TestContext {
    create_test_context_with_naming(behavior, NamingMode::Ai).await
}

/// Same as `create_test_context`, with an explicit naming mode
pub async fn create_test_context_with_naming(
    behavior: StubBehavior,
    naming_mode: NamingMode,
) -> TestContext {
    let tempdir = tempfile::tempdir().expect("Failed to create temp dir");
    let database_url = format!("sqlite:{}/test.db", tempdir.path().display());

    let database = Database::new(&database_url)
        .await
        .expect("Failed to open test database");

    let stub = Arc::new(StubProvider::new(behavior));
    let answers = AnswerProvider::with_provider(stub.clone(), 200, 0.1);

    let config = ServerConfig {
        http_port: 0,
        database_url,
        llm: LlmConfig {
            backend: LlmBackend::OpenRouter,
            openrouter: OpenRouterConfig {
                api_url: "http://localhost:0".to_owned(),
                api_key: None,
                model: "stub-model".to_owned(),
            },
            ollama: OllamaConfig {
                url: "http://localhost:0".to_owned(),
                model: "stub-model".to_owned(),
            },
            max_tokens: 200,
            temperature: 0.1,
        },
        naming_mode,
    };

    let resources = Arc::new(ServerResources::new(database, answers, config));
    let router = routes::router(resources.clone());

    TestContext {
        router,
        resources,
        stub,
        _tempdir: tempdir,
    }
}

/// A fixed user id for tests
pub const TEST_USER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
