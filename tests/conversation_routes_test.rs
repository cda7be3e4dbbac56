// ABOUTME: Integration tests for conversation management routes
// ABOUTME: Listing, filters, rename, favorite, delete cascade, and generate-name

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_test_context, StubBehavior, TEST_USER_ID};
use helpers::axum_test::AxumTestRequest;
use mathtutor_server::database::ConversationSummary;
use mathtutor_server::routes::ai_questions::ConversationResponse;
use mathtutor_server::routes::conversations::{
    ConversationHistoryResponse, GeneratedNameResponse,
};
use mathtutor_server::routes::{PageMeta, Paged};

async fn create_conversation(
    router: axum::Router,
    body: serde_json::Value,
) -> ConversationResponse {
    let response = AxumTestRequest::post("/api/conversations")
        .json(&body)
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_conversations_empty_is_ok() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::get(&format!("/api/conversations/user/{TEST_USER_ID}"))
        .send(ctx.router.clone())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let page: Paged<ConversationSummary> = response.json();
    assert!(page.items.is_empty());
    assert_eq!(page.meta.total_items, 0);
}

#[tokio::test]
async fn test_list_conversations_pagination_and_counts() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    for i in 1..=5 {
        create_conversation(
            ctx.router.clone(),
            json!({ "user_id": TEST_USER_ID, "name": format!("Conv {i}") }),
        )
        .await;
    }

    let response = AxumTestRequest::get(&format!(
        "/api/conversations/user/{TEST_USER_ID}?page=1&limit=2"
    ))
    .send(ctx.router.clone())
    .await;

    let page: Paged<ConversationSummary> = response.json();
    assert_eq!(page.items.len(), 2);
    let PageMeta {
        total_items,
        total_pages,
        current_page,
        per_page,
    } = page.meta;
    assert_eq!((total_items, total_pages, current_page, per_page), (5, 3, 1, 2));

    let response = AxumTestRequest::get(&format!(
        "/api/conversations/user/{TEST_USER_ID}?page=3&limit=2"
    ))
    .send(ctx.router.clone())
    .await;
    let page: Paged<ConversationSummary> = response.json();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_list_conversations_favorites_and_search_filters() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Derivatives", "is_favorite": true }),
    )
    .await;
    create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Integrals" }),
    )
    .await;

    let response = AxumTestRequest::get(&format!(
        "/api/conversations/user/{TEST_USER_ID}?favorites_only=true"
    ))
    .send(ctx.router.clone())
    .await;
    let page: Paged<ConversationSummary> = response.json();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name.as_deref(), Some("Derivatives"));

    let response = AxumTestRequest::get(&format!(
        "/api/conversations/user/{TEST_USER_ID}?search=integ"
    ))
    .send(ctx.router.clone())
    .await;
    let page: Paged<ConversationSummary> = response.json();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name.as_deref(), Some("Integrals"));
}

#[tokio::test]
async fn test_list_includes_message_count_and_preview() {
    let ctx = create_test_context(StubBehavior::Reply("the answer".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "With messages" }),
    )
    .await;

    for question in ["first question", "newest question"] {
        let response = AxumTestRequest::post("/api/ai-questions/ask")
            .json(&json!({
                "user_id": TEST_USER_ID,
                "question": question,
                "conversation_id": conversation.id
            }))
            .send(ctx.router.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let response = AxumTestRequest::get(&format!("/api/conversations/user/{TEST_USER_ID}"))
        .send(ctx.router.clone())
        .await;
    let page: Paged<ConversationSummary> = response.json();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].message_count, 2);
    assert_eq!(page.items[0].preview.as_deref(), Some("newest question"));
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_get_conversation_history_is_ordered() {
    let ctx = create_test_context(StubBehavior::Reply("a".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "History" }),
    )
    .await;

    for question in ["q one", "q two", "q three"] {
        AxumTestRequest::post("/api/ai-questions/ask")
            .json(&json!({
                "user_id": TEST_USER_ID,
                "question": question,
                "conversation_id": conversation.id
            }))
            .send(ctx.router.clone())
            .await;
    }

    let response = AxumTestRequest::get(&format!("/api/conversations/{}", conversation.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let history: ConversationHistoryResponse = response.json();
    let messages = history.messages.unwrap();
    let questions: Vec<&str> = messages.iter().map(|m| m.question.as_str()).collect();
    assert_eq!(questions, vec!["q one", "q two", "q three"]);
}

#[tokio::test]
async fn test_get_unknown_conversation_is_404() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response =
        AxumTestRequest::get("/api/conversations/99999999-9999-4999-8999-999999999999")
            .send(ctx.router.clone())
            .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Rename / Favorite
// ============================================================================

#[tokio::test]
async fn test_rename_conversation() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Original" }),
    )
    .await;

    let response = AxumTestRequest::put(&format!("/api/conversations/{}/name", conversation.id))
        .json(&json!({ "name": "Renamed" }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let updated: ConversationResponse = response.json();
    assert_eq!(updated.name.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn test_rename_with_overlong_name_is_rejected_and_leaves_name_unchanged() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Keep me" }),
    )
    .await;

    let response = AxumTestRequest::put(&format!("/api/conversations/{}/name", conversation.id))
        .json(&json!({ "name": "x".repeat(256) }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = AxumTestRequest::get(&format!("/api/conversations/{}", conversation.id))
        .send(ctx.router.clone())
        .await;
    let history: ConversationHistoryResponse = response.json();
    assert_eq!(history.conversation.name.as_deref(), Some("Keep me"));
}

#[tokio::test]
async fn test_toggle_favorite_roundtrip() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Fav" }),
    )
    .await;
    assert!(!conversation.is_favorite);

    let response =
        AxumTestRequest::put(&format!("/api/conversations/{}/favorite", conversation.id))
            .json(&json!({ "is_favorite": true }))
            .send(ctx.router.clone())
            .await;
    let updated: ConversationResponse = response.json();
    assert!(updated.is_favorite);

    let response =
        AxumTestRequest::put(&format!("/api/conversations/{}/favorite", conversation.id))
            .json(&json!({ "is_favorite": false }))
            .send(ctx.router.clone())
            .await;
    let updated: ConversationResponse = response.json();
    assert!(!updated.is_favorite);
}

#[tokio::test]
async fn test_rename_unknown_conversation_is_404() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response =
        AxumTestRequest::put("/api/conversations/99999999-9999-4999-8999-999999999999/name")
            .json(&json!({ "name": "whatever" }))
            .send(ctx.router.clone())
            .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_delete_conversation_cascades_to_messages() {
    let ctx = create_test_context(StubBehavior::Reply("a".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "Doomed" }),
    )
    .await;

    AxumTestRequest::post("/api/ai-questions/ask")
        .json(&json!({
            "user_id": TEST_USER_ID,
            "question": "will be deleted",
            "conversation_id": conversation.id
        }))
        .send(ctx.router.clone())
        .await;

    let response = AxumTestRequest::delete(&format!("/api/conversations/{}", conversation.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Conversation and its messages are both gone
    let response = AxumTestRequest::get(&format!("/api/conversations/{}", conversation.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let stored = ctx
        .resources
        .database
        .conversations()
        .count_messages()
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_delete_unknown_conversation_is_404() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response =
        AxumTestRequest::delete("/api/conversations/99999999-9999-4999-8999-999999999999")
            .send(ctx.router.clone())
            .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Generate Name
// ============================================================================

#[tokio::test]
async fn test_generate_name_from_first_message() {
    let ctx = create_test_context(StubBehavior::Reply("Chain rule explained".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "placeholder" }),
    )
    .await;

    AxumTestRequest::post("/api/ai-questions/ask")
        .json(&json!({
            "user_id": TEST_USER_ID,
            "question": "explain the chain rule",
            "conversation_id": conversation.id
        }))
        .send(ctx.router.clone())
        .await;

    let response = AxumTestRequest::post(&format!(
        "/api/conversations/{}/generate-name",
        conversation.id
    ))
    .send(ctx.router.clone())
    .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let generated: GeneratedNameResponse = response.json();
    assert_eq!(generated.name, "Chain rule explained");
    assert_eq!(
        generated.conversation.name.as_deref(),
        Some("Chain rule explained")
    );
}

#[tokio::test]
async fn test_generate_name_requires_messages() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let conversation = create_conversation(
        ctx.router.clone(),
        json!({ "user_id": TEST_USER_ID, "name": "No messages" }),
    )
    .await;

    let response = AxumTestRequest::post(&format!(
        "/api/conversations/{}/generate-name",
        conversation.id
    ))
    .send(ctx.router.clone())
    .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_name_unknown_conversation_is_404() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post(
        "/api/conversations/99999999-9999-4999-8999-999999999999/generate-name",
    )
    .send(ctx.router.clone())
    .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
