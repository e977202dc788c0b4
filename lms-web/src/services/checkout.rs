//! Checkout and free enrollment
//!
//! Paid courses only become accessible through a successful payment
//! notification. Checkout creates the pending payment the gateway will later
//! report on; free courses are granted immediately.

use lms_common::db::{Course, Payment};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::db::{begin_write, courses, enrollments, payments, users};
use crate::error::{ApiError, ApiResult};
use crate::services::enrollment::{grant_access, GrantOutcome};

/// New external invoice identifier: `QR` followed by 32 hex digits
pub fn new_invoice_id() -> String {
    format!("QR{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Course was free; access granted without a payment
    Enrolled,
    /// Pending payment awaiting the gateway
    Invoice(Payment),
}

#[derive(Debug, Clone)]
pub struct EnrollOutcome {
    pub course: Course,
    pub grant: GrantOutcome,
    pub first_lesson: Option<String>,
}

async fn load_buyer_and_course(
    conn: &mut SqliteConnection,
    user_id: i64,
    course_slug: &str,
) -> ApiResult<Course> {
    if users::find_by_id(&mut *conn, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    courses::find_published_by_slug(&mut *conn, course_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

/// Start a purchase of `course_slug` for `user_id`
pub async fn start_checkout(
    pool: &SqlitePool,
    user_id: i64,
    course_slug: &str,
) -> ApiResult<CheckoutOutcome> {
    let mut tx = begin_write(pool).await?;

    let course = load_buyer_and_course(&mut *tx, user_id, course_slug).await?;
    if enrollments::exists(&mut *tx, user_id, course.id).await? {
        return Err(ApiError::Conflict("Already enrolled".to_string()));
    }

    let amount: Decimal = course.charged_amount();
    let outcome = if amount.is_zero() {
        grant_access(&mut *tx, user_id, course.id).await?;
        CheckoutOutcome::Enrolled
    } else {
        let invoice_id = new_invoice_id();
        let payment = payments::create_pending(&mut *tx, &invoice_id, user_id, course.id, amount).await?;
        info!(
            invoice_id = %payment.invoice_id,
            user_id,
            course_id = course.id,
            amount = %payment.amount,
            "Created pending payment"
        );
        CheckoutOutcome::Invoice(payment)
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Enroll `user_id` in a free course
///
/// Repeating the call is harmless and reports `AlreadyEnrolled`.
pub async fn enroll_free(
    pool: &SqlitePool,
    user_id: i64,
    course_slug: &str,
) -> ApiResult<EnrollOutcome> {
    let mut tx = begin_write(pool).await?;

    let course = load_buyer_and_course(&mut *tx, user_id, course_slug).await?;
    if !course.is_free() {
        return Err(ApiError::PaymentRequired("Course requires payment".to_string()));
    }

    let grant = grant_access(&mut *tx, user_id, course.id).await?;
    let first_lesson = courses::first_lesson_slug(&mut *tx, course.id).await?;

    tx.commit().await?;
    Ok(EnrollOutcome {
        course,
        grant,
        first_lesson,
    })
}
