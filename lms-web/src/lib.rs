//! lms-web library - course marketplace payment and enrollment service
//!
//! Receives payment gateway notifications, reconciles them against pending
//! payments, and grants course access. Also serves the internal API the
//! front end uses for checkout, enrollment and lesson progress.

use std::time::Duration;

use axum::Router;
use lms_common::config::ServiceConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Gateway webhook secret; `None` makes the webhook fail closed
    pub kaspi_secret: Option<String>,
    /// Internal API secret; `None` disables internal API authentication
    pub api_secret: Option<String>,
    /// Gateway page a buyer is sent to after checkout
    pub payment_url: String,
    /// Upper bound for every storage operation
    pub db_timeout: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &ServiceConfig) -> Self {
        Self {
            db,
            kaspi_secret: config.kaspi_secret.clone(),
            api_secret: config.api_secret.clone(),
            payment_url: config.kaspi_payment_url.clone(),
            db_timeout: config.db_timeout(),
        }
    }
}

/// Build application router
///
/// `/health`, `/api/buildinfo` and the webhook are public; everything else
/// under `/api` goes through [`api::auth_middleware`].
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{any, get, post};

    let protected = Router::new()
        .route("/api/checkout", post(api::checkout))
        .route("/api/enroll", post(api::enroll))
        .route("/api/progress", post(api::update_progress))
        .route("/api/users/:user_id/courses", get(api::my_courses))
        .route(
            "/api/users/:user_id/access/:course_slug",
            get(api::course_access),
        )
        .route("/api/courses/:course_slug/students", get(api::students))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // The webhook answers every method itself so non-POST gets its JSON error
    let public = Router::new()
        .route("/payment/webhook", any(api::payment_webhook))
        .route("/kaspi/webhook", any(api::payment_webhook))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
