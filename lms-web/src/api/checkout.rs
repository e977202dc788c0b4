//! Checkout and free enrollment endpoints
//!
//! Called by the session-holding front end on behalf of a logged-in user.

use axum::{extract::State, http::StatusCode, Json};
use lms_common::money::to_storage;
use serde::{Deserialize, Serialize};

use crate::db::bounded;
use crate::error::ApiResult;
use crate::services::{enroll_free, start_checkout, CheckoutOutcome};
use crate::AppState;

/// Body of `POST /api/checkout` and `POST /api/enroll`
#[derive(Debug, Deserialize)]
pub struct CourseRequest {
    pub user_id: i64,
    pub course_slug: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CheckoutResponse {
    Enrolled {
        enrolled: bool,
        course_slug: String,
    },
    Invoice {
        invoice_id: String,
        amount: String,
        status: String,
        payment_url: String,
    },
}

/// POST /api/checkout
///
/// Free courses enroll immediately; paid ones get a pending payment and the
/// gateway URL the buyer is sent to.
pub async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CourseRequest>,
) -> ApiResult<(StatusCode, Json<CheckoutResponse>)> {
    let outcome = bounded(
        "checkout",
        state.db_timeout,
        start_checkout(&state.db, req.user_id, &req.course_slug),
    )
    .await?;

    let response = match outcome {
        CheckoutOutcome::Enrolled => CheckoutResponse::Enrolled {
            enrolled: true,
            course_slug: req.course_slug,
        },
        CheckoutOutcome::Invoice(payment) => CheckoutResponse::Invoice {
            invoice_id: payment.invoice_id,
            amount: to_storage(payment.amount),
            status: payment.status.to_string(),
            payment_url: state.payment_url.clone(),
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    pub course_slug: String,
    pub created: bool,
    pub first_lesson: Option<String>,
}

/// POST /api/enroll
///
/// Free courses only. Returns 201 for a new enrollment, 200 when the user
/// was already enrolled.
pub async fn enroll(
    State(state): State<AppState>,
    Json(req): Json<CourseRequest>,
) -> ApiResult<(StatusCode, Json<EnrollResponse>)> {
    let outcome = bounded(
        "enroll",
        state.db_timeout,
        enroll_free(&state.db, req.user_id, &req.course_slug),
    )
    .await?;

    let created = outcome.grant.created();
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(EnrollResponse {
            course_slug: outcome.course.slug,
            created,
            first_lesson: outcome.first_lesson,
        }),
    ))
}
