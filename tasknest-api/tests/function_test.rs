//! Integration tests for the create-task-with-ai function
//!
//! Run against a real database; see `common/mod.rs`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestContext;
use serde_json::{json, Value};
use std::sync::Arc;
use tasknest_shared::ai::StaticSuggester;
use tasknest_shared::models::label_suggestion::LabelSuggestion;
use tasknest_shared::models::task::{Task, TaskLabel};
use uuid::Uuid;

const FUNCTION_URI: &str = "/functions/v1/create-task-with-ai";

async fn invoke(ctx: &TestContext, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(FUNCTION_URI)
        .header(header::AUTHORIZATION, ctx.auth_header())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    ctx.send(request).await
}

fn task_id(task: &Value) -> Uuid {
    task["task_id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_ai_label_applied_and_logged() {
    let ctx = require_db!(TestContext::new().await);

    let (status, task) = invoke(
        &ctx,
        json!({ "title": "Buy groceries", "description": "", "completed": false, "label": "", "due_date": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", task);
    assert_eq!(task["label"], "shopping");
    assert!(task["description"].is_null());
    assert!(task["due_date"].is_null());
    assert_eq!(ctx.suggester.as_ref().unwrap().calls(), 1);

    let log = LabelSuggestion::list_by_task(&ctx.db, task_id(&task), ctx.user.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].suggested_label, TaskLabel::Shopping);
    assert_eq!(log[0].original_title, "Buy groceries");
    assert!(log[0].original_description.is_none());
    assert!(log[0].accepted);

    let (status, listed) = ctx.request(Method::GET, "/v1/label-suggestions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_explicit_label_skips_ai() {
    let ctx = require_db!(TestContext::new().await);

    let (status, task) = invoke(
        &ctx,
        json!({ "title": "Quarterly report", "label": "work", "completed": true, "due_date": "2025-03-31" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["label"], "work");
    assert_eq!(task["completed"], true);
    assert_eq!(task["due_date"], "2025-03-31");
    assert_eq!(ctx.suggester.as_ref().unwrap().calls(), 0);

    let log = LabelSuggestion::list_by_task(&ctx.db, task_id(&task), ctx.user.id).await.unwrap();
    assert!(log.is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_unusable_suggestion_leaves_label_empty() {
    let ctx = require_db!(TestContext::with_suggester(Some(Arc::new(StaticSuggester::new(None)))).await);

    let (status, task) = invoke(&ctx, json!({ "title": "Something vague" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(task["label"].is_null());
    assert!(LabelSuggestion::list_by_user(&ctx.db, ctx.user.id).await.unwrap().is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_ai_failure_fails_request() {
    let ctx = require_db!(TestContext::with_suggester(Some(Arc::new(StaticSuggester::failing()))).await);

    let (status, body) = invoke(&ctx, json!({ "title": "Call plumber" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("AI request failed"), "{}", body);
    assert_eq!(Task::count_by_user(&ctx.db, ctx.user.id).await.unwrap(), 0);

    // An explicit label never reaches the failing suggester
    let (status, task) = invoke(&ctx, json!({ "title": "Call plumber", "label": "home" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["label"], "home");

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_suggestion_log_failure_keeps_task() {
    let ctx = require_db!(TestContext::new().await);

    // Reject suggestion rows for this user only; other tests share the table
    let name = format!("reject_suggestions_{}", ctx.user.id.simple());
    sqlx::query(&format!(
        "CREATE FUNCTION {name}() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'suggestion log unavailable'; END; \
         $$ LANGUAGE plpgsql"
    ))
    .execute(&ctx.db)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {name} BEFORE INSERT ON ai_label_suggestions \
         FOR EACH ROW WHEN (NEW.user_id = '{user_id}') EXECUTE FUNCTION {name}()",
        user_id = ctx.user.id
    ))
    .execute(&ctx.db)
    .await
    .unwrap();

    let (status, task) = invoke(&ctx, json!({ "title": "Buy groceries" })).await;

    sqlx::query(&format!("DROP TRIGGER {name} ON ai_label_suggestions"))
        .execute(&ctx.db)
        .await
        .unwrap();
    sqlx::query(&format!("DROP FUNCTION {name}()"))
        .execute(&ctx.db)
        .await
        .unwrap();

    assert_eq!(status, StatusCode::OK, "{}", task);
    assert_eq!(task["label"], "shopping");
    assert!(LabelSuggestion::list_by_task(&ctx.db, task_id(&task), ctx.user.id)
        .await
        .unwrap()
        .is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_without_suggester() {
    let ctx = require_db!(TestContext::with_suggester(None).await);

    let (status, task) = invoke(&ctx, json!({ "title": "Walk the dog" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(task["label"].is_null());

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_errors_are_400_with_message() {
    let ctx = require_db!(TestContext::new().await);

    let (status, body) = invoke(&ctx, json!({ "description": "no title" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Title is required" }));

    let (status, body) = invoke(&ctx, json!({ "title": "x", "label": "urgent" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid label"));

    let (status, body) = invoke(&ctx, json!({ "title": "x".repeat(256) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title must be at most 255 characters");
    assert_eq!(Task::count_by_user(&ctx.db, ctx.user.id).await.unwrap(), 0);

    ctx.cleanup().await;
}

#[tokio::test]
async fn test_deleted_user_token() {
    let ctx = require_db!(TestContext::new().await);
    let (other, token) = ctx.other_user().await;
    tasknest_shared::models::user::User::delete(&ctx.db, other.id).await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri(FUNCTION_URI)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(json!({ "title": "Ghost" }).to_string()))
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No user found");

    ctx.cleanup().await;
}
