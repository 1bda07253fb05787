//! API tests for complaints, passwords, registration and health
//!
//! Ingestion endpoints are covered in `ingestion_tests.rs`.

mod common;

use axum::http::StatusCode;
use common::{error_code, reset_token, TestApp, TEACHERS_ADDRESS};
use portal_common::Role;
use portal_server::db::RecordStore;
use serde_json::json;

// ============================================================================
// Complaints
// ============================================================================

async fn app_with_school() -> TestApp {
    let app = TestApp::new();
    app.seed_account("mr_smith", Role::Staff, "staff-pw").await;
    app.seed_account("alice", Role::Student, "alice-pw").await;
    app
}

async fn submit(app: &TestApp, subject: &str, content: &str) -> (StatusCode, serde_json::Value) {
    app.post_json(
        "/api/v1/complaints",
        Some("alice"),
        json!({ "subject": subject, "content": content }),
    )
    .await
}

#[tokio::test]
async fn test_submit_complaint_records_caller_and_notifies_teachers() {
    let app = app_with_school().await;

    let (status, body) = submit(&app, "Math grade", "My math score looks wrong").await;

    assert_eq!(status, StatusCode::CREATED);
    let complaint = &body["data"];
    assert_eq!(complaint["student"], json!("alice"));
    assert_eq!(complaint["subject"], json!("Math grade"));
    assert_eq!(complaint["resolved"], json!(false));

    let id = complaint["id"].as_str().unwrap();
    assert!(app.store.get_complaint(id).await.unwrap().is_some());

    let sent = app.notifier.sent_to(TEACHERS_ADDRESS).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New Student Complaint");
    assert!(sent[0].body.contains("alice"));
}

#[tokio::test]
async fn test_complaint_length_boundaries() {
    let app = app_with_school().await;

    let (status, _) = submit(&app, &"s".repeat(100), &"c".repeat(1000)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = submit(&app, &"s".repeat(101), "body").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, _) = submit(&app, "subject", &"c".repeat(1001)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = submit(&app, "  ", "body").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(app.store.list_complaints().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_complaint_survives_notifier_outage() {
    let app = app_with_school().await;
    app.notifier.set_unavailable(true);

    let (status, _) = submit(&app, "Late results", "Physics results are missing").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.store.list_complaints().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_complaint_requires_identity() {
    let app = app_with_school().await;

    let (status, _) = app
        .post_json(
            "/api/v1/complaints",
            None,
            json!({ "subject": "x", "content": "y" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_list_and_resolve_complaints() {
    let app = app_with_school().await;
    let (_, body) = submit(&app, "Math grade", "Please recheck").await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    submit(&app, "Art grade", "Missing project mark").await;

    let (status, _) = app.get("/api/v1/complaints", Some("alice")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/v1/complaints", Some("mr_smith")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(2));
    assert_eq!(body["data"]["open"], json!(2));

    let uri = format!("/api/v1/complaints/{}/resolve", id);
    let (status, _) = app.post_json(&uri, Some("alice"), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post_json(&uri, Some("mr_smith"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolved"], json!(true));

    // Resolving again is accepted and changes nothing
    let (status, _) = app.post_json(&uri, Some("mr_smith"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/v1/complaints", Some("mr_smith")).await;
    assert_eq!(body["data"]["open"], json!(1));
}

#[tokio::test]
async fn test_resolve_unknown_complaint() {
    let app = app_with_school().await;

    let (status, body) = app
        .post_json("/api/v1/complaints/no-such-id/resolve", Some("mr_smith"), json!({}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

// ============================================================================
// Passwords
// ============================================================================

async fn verify(app: &TestApp, username: &str, password: &str) -> StatusCode {
    app.post_json(
        "/api/v1/auth/verify",
        None,
        json!({ "username": username, "password": password }),
    )
    .await
    .0
}

async fn request_reset(app: &TestApp, username: &str) -> (StatusCode, serde_json::Value) {
    app.post_json(
        "/api/v1/password-reset",
        None,
        json!({ "username": username }),
    )
    .await
}

async fn confirm_reset(app: &TestApp, token: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.post_json(
        "/api/v1/password-reset/confirm",
        None,
        json!({ "token": token, "new_password": password }),
    )
    .await
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = app_with_school().await;

    let (status, _) = request_reset(&app, "alice").await;
    assert_eq!(status, StatusCode::OK);

    let sent = app.notifier.sent_to("alice@school.test").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Password Reset Request");
    assert!(sent[0].body.contains("https://portal.test/reset?token="));
    let token = reset_token(&sent[0].body);

    let account = app.store.get_account("alice").await.unwrap().unwrap();
    assert_eq!(account.reset_token.as_deref(), Some(token.as_str()));

    let (status, _) = confirm_reset(&app, &token, "fresh-pw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify(&app, "alice", "fresh-pw").await, StatusCode::OK);
    assert_eq!(verify(&app, "alice", "alice-pw").await, StatusCode::UNAUTHORIZED);

    let account = app.store.get_account("alice").await.unwrap().unwrap();
    assert!(account.reset_token.is_none());

    let (status, body) = confirm_reset(&app, &token, "another-pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_TOKEN");
    assert_eq!(verify(&app, "alice", "fresh-pw").await, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_confirms_consume_token_once() {
    let app = app_with_school().await;

    request_reset(&app, "alice").await;
    let token = reset_token(&app.notifier.sent_to("alice@school.test").await[0].body);

    let (first, second) = tokio::join!(
        confirm_reset(&app, &token, "first-pw"),
        confirm_reset(&app, &token, "second-pw"),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

    let winner = if first.0 == StatusCode::OK { "first-pw" } else { "second-pw" };
    let loser = if winner == "first-pw" { "second-pw" } else { "first-pw" };
    assert_eq!(verify(&app, "alice", winner).await, StatusCode::OK);
    assert_eq!(verify(&app, "alice", loser).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_reset_request_invalidates_previous_token() {
    let app = app_with_school().await;

    request_reset(&app, "alice").await;
    request_reset(&app, "alice").await;
    let sent = app.notifier.sent_to("alice@school.test").await;
    let (first, second) = (reset_token(&sent[0].body), reset_token(&sent[1].body));
    assert_ne!(first, second);

    let (status, _) = confirm_reset(&app, &first, "fresh-pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = confirm_reset(&app, &second, "fresh-pw").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_edge_cases() {
    let app = app_with_school().await;

    let (status, body) = request_reset(&app, "ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let (status, body) = confirm_reset(&app, "never-issued", "fresh-pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_TOKEN");

    // An empty new password is rejected without consuming the token
    request_reset(&app, "alice").await;
    let token = reset_token(&app.notifier.sent_to("alice@school.test").await[0].body);
    let (status, _) = confirm_reset(&app, &token, "").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = confirm_reset(&app, &token, "fresh-pw").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password() {
    let app = app_with_school().await;

    let (status, body) = app
        .post_json(
            "/api/v1/change-password",
            Some("alice"),
            json!({ "current_password": "wrong", "new_password": "next-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, _) = app
        .post_json(
            "/api/v1/change-password",
            Some("alice"),
            json!({ "current_password": "alice-pw", "new_password": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .post_json(
            "/api/v1/change-password",
            Some("alice"),
            json!({ "current_password": "alice-pw", "new_password": "next-pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], json!("Password changed"));
    assert_eq!(verify(&app, "alice", "next-pw").await, StatusCode::OK);

    let (status, _) = app
        .post_json(
            "/api/v1/change-password",
            None,
            json!({ "current_password": "next-pw", "new_password": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_student() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/api/v1/register",
            None,
            json!({ "username": "carol", "email": "c@x.com", "password": "carol-pw" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["data"],
        json!({ "username": "carol", "email": "c@x.com", "user_type": "STUDENT" })
    );
    assert!(body["data"].get("password").is_none());

    let account = app.store.get_account("carol").await.unwrap().unwrap();
    assert_ne!(account.password, "carol-pw");
    assert_eq!(verify(&app, "carol", "carol-pw").await, StatusCode::OK);

    let sent = app.notifier.sent_to("c@x.com").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Welcome to Result Portal");
    assert_eq!(app.notifier.subscriptions().await, vec!["c@x.com"]);
}

#[tokio::test]
async fn test_register_rejections() {
    let app = app_with_school().await;

    let (status, body) = app
        .post_json(
            "/api/v1/register",
            None,
            json!({ "username": "alice", "email": "a@x.com", "password": "pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    let (status, _) = app
        .post_json(
            "/api/v1/register",
            None,
            json!({ "username": "eve", "email": "e@x.com", "password": "pw", "user_type": "ADMIN" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.store.get_account("eve").await.unwrap().is_none());

    let (status, _) = app
        .post_json(
            "/api/v1/register",
            None,
            json!({ "username": "dave", "email": "not-an-email", "password": "pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_verify_unknown_user() {
    let app = TestApp::new();
    assert_eq!(verify(&app, "nobody", "pw").await, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_store_state() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));

    app.store.set_unavailable(true).await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("unhealthy"));
}

#[tokio::test]
async fn test_store_outage_maps_to_dependency_error() {
    let app = app_with_school().await;
    app.store.set_unavailable(true).await;

    // Identity lookup itself needs the store
    let (status, body) = app.get("/api/v1/students/my-results", Some("alice")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "DEPENDENCY_ERROR");
}
