// ABOUTME: Integration tests for exercises, study guides, progress, and health
// ABOUTME: CRUD round-trips, validation rejections, and not-found handling

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_test_context, StubBehavior, TEST_USER_ID};
use helpers::axum_test::AxumTestRequest;
use mathtutor_server::database::{
    ExerciseRecord, StudyGuideRecord, UserExerciseRecord, UserProgressRecord,
};
use mathtutor_server::routes::Paged;
use mathtutor_server::routes::health::HealthResponse;

const GUIDE_BODY: &str = r#"{"sections": ["intro", "practice"]}"#;

// ============================================================================
// Exercises
// ============================================================================

#[tokio::test]
async fn test_exercise_crud_roundtrip() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/exercises")
        .json(&json!({
            "title": "Derivative basics",
            "difficulty": "medium",
            "content": { "prompt": "Differentiate x^2" },
            "topic": "derivatives",
            "tags": ["calculus"]
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let exercise: ExerciseRecord = response.json();
    assert_eq!(exercise.difficulty, "medium");

    // Read back
    let response = AxumTestRequest::get(&format!("/api/exercises/{}", exercise.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let fetched: ExerciseRecord = response.json();
    assert_eq!(fetched.title, "Derivative basics");
    assert_eq!(fetched.content["prompt"], "Differentiate x^2");

    // Partial update keeps unset fields
    let response = AxumTestRequest::put(&format!("/api/exercises/{}", exercise.id))
        .json(&json!({ "difficulty": "hard" }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: ExerciseRecord = response.json();
    assert_eq!(updated.difficulty, "hard");
    assert_eq!(updated.title, "Derivative basics");

    // Delete
    let response = AxumTestRequest::delete(&format!("/api/exercises/{}", exercise.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = AxumTestRequest::get(&format!("/api/exercises/{}", exercise.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exercise_invalid_difficulty_is_rejected() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/exercises")
        .json(&json!({
            "title": "Bad difficulty",
            "difficulty": "impossible",
            "content": {}
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exercise_list_pagination() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    for i in 1..=3 {
        AxumTestRequest::post("/api/exercises")
            .json(&json!({ "title": format!("Exercise {i}"), "content": {} }))
            .send(ctx.router.clone())
            .await;
    }

    let response = AxumTestRequest::get("/api/exercises?page=1&limit=2")
        .send(ctx.router.clone())
        .await;
    let page: Paged<ExerciseRecord> = response.json();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.meta.total_items, 3);
    assert_eq!(page.meta.total_pages, 2);
}

#[tokio::test]
async fn test_user_exercise_attempt_roundtrip() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/exercises")
        .json(&json!({ "title": "Attempt me", "content": {} }))
        .send(ctx.router.clone())
        .await;
    let exercise: ExerciseRecord = response.json();

    let response = AxumTestRequest::post("/api/user-exercises")
        .json(&json!({
            "user_id": TEST_USER_ID,
            "exercise_id": exercise.id,
            "answer": { "value": "2x" },
            "is_correct": true
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let attempt: UserExerciseRecord = response.json();
    assert!(attempt.is_correct);

    let response = AxumTestRequest::get(&format!("/api/user-exercises/user/{TEST_USER_ID}"))
        .send(ctx.router.clone())
        .await;
    let attempts: Vec<UserExerciseRecord> = response.json();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].answer.as_ref().unwrap()["value"], "2x");
}

#[tokio::test]
async fn test_user_exercise_requires_existing_exercise() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/user-exercises")
        .json(&json!({
            "user_id": TEST_USER_ID,
            "exercise_id": "99999999-9999-4999-8999-999999999999",
            "is_correct": false
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Study Guides
// ============================================================================

#[tokio::test]
async fn test_study_guide_crud_roundtrip() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/study-guides")
        .json(&json!({
            "title": "Week one",
            "week": 1,
            "day": 2,
            "level": "intermediate",
            "content": serde_json::from_str::<serde_json::Value>(GUIDE_BODY).unwrap()
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let guide: StudyGuideRecord = response.json();
    assert_eq!(guide.level, "intermediate");

    let response = AxumTestRequest::put(&format!("/api/study-guides/{}", guide.id))
        .json(&json!({ "title": "Week one, revised" }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: StudyGuideRecord = response.json();
    assert_eq!(updated.title, "Week one, revised");
    assert_eq!(updated.week, 1);

    let response = AxumTestRequest::delete(&format!("/api/study-guides/{}", guide.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = AxumTestRequest::get(&format!("/api/study-guides/{}", guide.id))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_study_guides_listed_in_program_order() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    for (title, week, day) in [("Late", 2, 1), ("Early", 1, 1), ("Mid", 1, 3)] {
        AxumTestRequest::post("/api/study-guides")
            .json(&json!({ "title": title, "week": week, "day": day }))
            .send(ctx.router.clone())
            .await;
    }

    let response = AxumTestRequest::get("/api/study-guides")
        .send(ctx.router.clone())
        .await;
    let page: Paged<StudyGuideRecord> = response.json();
    let titles: Vec<&str> = page.items.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["Early", "Mid", "Late"]);
}

#[tokio::test]
async fn test_study_guide_invalid_level_is_rejected() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/study-guides")
        .json(&json!({ "title": "Bad level", "week": 1, "day": 1, "level": "wizard" }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// User Progress
// ============================================================================

#[tokio::test]
async fn test_progress_roundtrip_and_completion_timestamps() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/study-guides")
        .json(&json!({ "title": "Tracked", "week": 1, "day": 1 }))
        .send(ctx.router.clone())
        .await;
    let guide: StudyGuideRecord = response.json();

    let response = AxumTestRequest::post("/api/user-progress")
        .json(&json!({ "user_id": TEST_USER_ID, "study_guide_id": guide.id }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let progress: UserProgressRecord = response.json();
    assert!(!progress.completed);
    assert!(progress.completed_at.is_none());

    // Complete it
    let response = AxumTestRequest::put(&format!("/api/user-progress/{}", progress.id))
        .json(&json!({ "completed": true }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let completed: UserProgressRecord = response.json();
    assert!(completed.completed);
    assert!(completed.completed_at.is_some());

    // Listing for the user finds it
    let response = AxumTestRequest::get(&format!("/api/user-progress/user/{TEST_USER_ID}"))
        .send(ctx.router.clone())
        .await;
    let records: Vec<UserProgressRecord> = response.json();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_progress_requires_existing_study_guide() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::post("/api/user-progress")
        .json(&json!({
            "user_id": TEST_USER_ID,
            "study_guide_id": "99999999-9999-4999-8999-999999999999"
        }))
        .send(ctx.router.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_database_and_provider() {
    let ctx = create_test_context(StubBehavior::Reply("unused".to_owned())).await;

    let response = AxumTestRequest::get("/health").send(ctx.router.clone()).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.database, "up");
    assert_eq!(health.provider, "stub");
}
