//! Security tests for lms-web
//!
//! Tests the internal API authentication boundary:
//! - stale and future timestamps
//! - wrong, missing and tampered hashes
//! - GET signatures bound to their path
//! - 1 MiB body limit on authenticated requests

mod helpers;

use axum::{body::Body, http::Request, http::StatusCode};
use helpers::*;
use lms_common::api::{calculate_hash, sign_request};
use lms_common::time::now_millis;
use lms_web::api::auth::MAX_AUTH_BODY_BYTES;
use serde_json::json;

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_unsigned_request_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(post_json(
            "/api/enroll",
            json!({"user_id": 1, "course_slug": "intro"}).to_string(),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Missing"));
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let app = TestApp::new().await;

    let mut body = json!({"user_id": 1, "course_slug": "intro"});
    sign_request(&mut body, API_SECRET, now_millis() - 60_000);
    let response = app.send(post_json("/api/enroll", body.to_string())).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_future_timestamp_rejected() {
    let app = TestApp::new().await;

    let mut body = json!({"user_id": 1, "course_slug": "intro"});
    sign_request(&mut body, API_SECRET, now_millis() + 10_000);
    let response = app.send(post_json("/api/enroll", body.to_string())).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extreme_timestamps_rejected() {
    let app = TestApp::new().await;

    for timestamp in [i64::MIN, i64::MAX] {
        // Correctly signed, so only the timestamp window can reject it
        let mut body = json!({"user_id": 1, "course_slug": "intro"});
        sign_request(&mut body, API_SECRET, timestamp);
        let response = app.send(post_json("/api/checkout", body.to_string())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "timestamp {}", timestamp);

        let unsigned = json!({"timestamp": timestamp, "hash": "00", "user_id": 1});
        let response = app.send(post_json("/api/checkout", unsigned.to_string())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "timestamp {}", timestamp);
    }
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(signed_post(
            "/api/enroll",
            json!({"user_id": 1, "course_slug": "intro"}),
            "wrong-secret",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(extract_json(response).await, json!({"error": "Invalid hash"}));
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let app = TestApp::new().await;
    let victim = create_user(&app.pool, "victim").await;
    create_course(&app.pool, "intro", "0", None).await;

    let mut body = json!({"user_id": victim + 1, "course_slug": "intro"});
    sign_request(&mut body, API_SECRET, now_millis());
    body["user_id"] = json!(victim);
    let response = app.send(post_json("/api/enroll", body.to_string())).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&app.pool, "enrollments").await, 0);
}

#[tokio::test]
async fn test_get_signature_bound_to_path() {
    let app = TestApp::new().await;
    let alice = create_user(&app.pool, "alice").await;
    let bob = create_user(&app.pool, "bob").await;

    let timestamp = now_millis().to_string();
    let signed_path = format!("/api/users/{}/courses", alice);
    let hash = calculate_hash(&json!({"timestamp": timestamp, "path": signed_path}), API_SECRET);

    let replayed = format!("/api/users/{}/courses?timestamp={}&hash={}", bob, timestamp, hash);
    let response = app.send(plain_request("GET", &replayed)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let original = format!("{}?timestamp={}&hash={}", signed_path, timestamp, hash);
    let response = app.send(plain_request("GET", &original)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_without_query_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(plain_request("GET", "/api/courses/intro/students"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_size_limit() {
    let app = TestApp::new().await;

    let oversized = "x".repeat(MAX_AUTH_BODY_BYTES + 1024);
    let response = app.send(post_json("/api/enroll", oversized)).await;

    assert!(
        response.status() == StatusCode::PAYLOAD_TOO_LARGE
            || response.status() == StatusCode::BAD_REQUEST,
        "Expected 413/400 for oversized body, got {}",
        response.status()
    );
}

#[tokio::test]
async fn test_auth_disabled_without_api_secret() {
    let app = TestApp::with_secrets(Some(KASPI_SECRET), None).await;
    let user_id = create_user(&app.pool, "alice").await;
    create_course(&app.pool, "intro", "0", None).await;

    let response = app
        .send(post_json(
            "/api/enroll",
            json!({"user_id": user_id, "course_slug": "intro"}).to_string(),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_webhook_not_behind_internal_auth() {
    let app = TestApp::new().await;
    seed_pending_payment(&app.pool).await;

    // Gateway requests carry no timestamp/hash; only the body signature counts
    let body = r#"{"invoiceId":"QR123","status":"success","amount":100.00}"#;
    let response = app.send(webhook_request(body, KASPI_SECRET)).await;

    assert_eq!(response.status(), StatusCode::OK);
}
