//! Shared helpers for lms-web integration tests
//!
//! Each test gets its own temporary SQLite file with the full schema, so
//! tests run in parallel without sharing state.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use lms_common::api::{calculate_hash, sign_payload, sign_request, SIGNATURE_HEADER};
use lms_common::db::init_database;
use lms_common::time::now_millis;
use lms_web::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const KASPI_SECRET: &str = "test-kaspi-secret";
pub const API_SECRET: &str = "test-api-secret";
pub const PAYMENT_URL: &str = "https://pay.example.test/qr";

/// Router plus the database behind it
pub struct TestApp {
    pub pool: SqlitePool,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Both secrets configured
    pub async fn new() -> Self {
        Self::with_secrets(Some(KASPI_SECRET), Some(API_SECRET)).await
    }

    pub async fn with_secrets(kaspi: Option<&str>, api: Option<&str>) -> Self {
        let dir = TempDir::new().expect("Should create temp dir");
        let pool = init_database(&dir.path().join("lms.db"), Duration::from_secs(5))
            .await
            .expect("Should initialize database");

        let state = AppState {
            db: pool.clone(),
            kaspi_secret: kaspi.map(str::to_string),
            api_secret: api.map(str::to_string),
            payment_url: PAYMENT_URL.to_string(),
            db_timeout: Duration::from_secs(5),
        };

        Self {
            pool,
            state,
            _dir: dir,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::util::ServiceExt;
        self.router().oneshot(request).await.expect("Router is infallible")
    }

    /// Fire all requests at once on separate tasks; statuses in request order
    pub async fn send_concurrently(&self, requests: Vec<Request<Body>>) -> Vec<StatusCode> {
        use tower::util::ServiceExt;

        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let router = self.router();
                tokio::spawn(async move {
                    router.oneshot(request).await.expect("Router is infallible").status()
                })
            })
            .collect();

        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.await.expect("Request task panicked"));
        }
        statuses
    }
}

// =============================================================================
// Seed data
// =============================================================================

pub async fn create_user(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (username) VALUES (?) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("Should insert user")
}

pub async fn create_course(
    pool: &SqlitePool,
    slug: &str,
    price: &str,
    discount_price: Option<&str>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO courses (title, slug, price, discount_price) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(format!("Course {}", slug))
    .bind(slug)
    .bind(price)
    .bind(discount_price)
    .fetch_one(pool)
    .await
    .expect("Should insert course")
}

/// One module with `count` active lessons named `lesson-1..`
pub async fn add_lessons(pool: &SqlitePool, course_id: i64, count: i64) -> Vec<i64> {
    let module_id: i64 =
        sqlx::query_scalar("INSERT INTO modules (course_id, title) VALUES (?, 'Intro') RETURNING id")
            .bind(course_id)
            .fetch_one(pool)
            .await
            .expect("Should insert module");

    let mut ids = Vec::new();
    for position in 1..=count {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO lessons (module_id, title, slug, position) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(module_id)
        .bind(format!("Lesson {}", position))
        .bind(format!("lesson-{}", position))
        .bind(position)
        .fetch_one(pool)
        .await
        .expect("Should insert lesson");
        ids.push(id);
    }
    ids
}

pub async fn create_payment(
    pool: &SqlitePool,
    invoice_id: &str,
    user_id: i64,
    course_id: i64,
    amount: &str,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO payments (invoice_id, user_id, course_id, amount, status) \
         VALUES (?, ?, ?, ?, 'pending') RETURNING id",
    )
    .bind(invoice_id)
    .bind(user_id)
    .bind(course_id)
    .bind(amount)
    .fetch_one(pool)
    .await
    .expect("Should insert payment")
}

/// Buyer + 100.00 course + pending payment `QR123`
pub async fn seed_pending_payment(pool: &SqlitePool) -> (i64, i64) {
    let user_id = create_user(pool, "buyer").await;
    let course_id = create_course(pool, "rust-101", "100.00", None).await;
    create_payment(pool, "QR123", user_id, course_id, "100.00").await;
    (user_id, course_id)
}

pub async fn payment_status(pool: &SqlitePool, invoice_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM payments WHERE invoice_id = ?")
        .bind(invoice_id)
        .fetch_one(pool)
        .await
        .expect("Payment should exist")
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("Should count rows")
}

pub async fn enrollment_count(pool: &SqlitePool, user_id: i64, course_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE user_id = ? AND course_id = ?")
        .bind(user_id)
        .bind(course_id)
        .fetch_one(pool)
        .await
        .expect("Should count enrollments")
}

// =============================================================================
// Requests
// =============================================================================

/// Gateway notification signed with `secret`
pub fn webhook_request(body: &str, secret: &str) -> Request<Body> {
    webhook_request_with_signature(body, &sign_payload(secret, body.as_bytes()))
}

pub fn webhook_request_with_signature(body: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payment/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Internal API POST with a fresh timestamp and hash
pub fn signed_post(uri: &str, mut body: Value, secret: &str) -> Request<Body> {
    sign_request(&mut body, secret, now_millis());
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Internal API GET; timestamp and hash travel in the query string
pub fn signed_get(path: &str, secret: &str) -> Request<Body> {
    let timestamp = now_millis().to_string();
    let hash = calculate_hash(&json!({"timestamp": timestamp, "path": path}), secret);
    Request::builder()
        .method("GET")
        .uri(format!("{}?timestamp={}&hash={}", path, timestamp, hash))
        .body(Body::empty())
        .unwrap()
}

pub fn plain_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Extract JSON body from response
pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
