//! Payment queries
//!
//! Payments are created at checkout and afterwards only touched through
//! [`lock_by_invoice`] + [`update_status`] inside one transaction.

use lms_common::db::{Payment, PaymentStatus};
use lms_common::money::to_storage;
use lms_common::Result;
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite};

const PAYMENT_COLUMNS: &str =
    "id, invoice_id, user_id, course_id, amount, status, created_at, updated_at";

/// Insert a pending payment and return it
pub async fn create_pending<'e, E>(
    executor: E,
    invoice_id: &str,
    user_id: i64,
    course_id: i64,
    amount: Decimal,
) -> Result<Payment>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO payments (invoice_id, user_id, course_id, amount, status) \
         VALUES (?, ?, ?, ?, ?) RETURNING {}",
        PAYMENT_COLUMNS
    );
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(invoice_id)
        .bind(user_id)
        .bind(course_id)
        .bind(to_storage(amount))
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(executor)
        .await?;
    Ok(payment)
}

pub async fn find_by_invoice<'e, E>(executor: E, invoice_id: &str) -> Result<Option<Payment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM payments WHERE invoice_id = ?",
        PAYMENT_COLUMNS
    );
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(invoice_id)
        .fetch_optional(executor)
        .await?;
    Ok(payment)
}

/// Take the database write lock on behalf of one payment row
///
/// SQLite has no `SELECT ... FOR UPDATE`; a no-op write as the first
/// statement of a transaction acquires the write lock up front, so a
/// concurrent transaction for the same invoice waits in the busy handler
/// instead of reading stale state. Returns `false` if no row matches.
pub async fn lock_by_invoice<'e, E>(executor: E, invoice_id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE payments SET updated_at = updated_at WHERE invoice_id = ?")
        .bind(invoice_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_status<'e, E>(executor: E, payment_id: i64, status: &PaymentStatus) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE payments SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(status.as_str())
        .bind(payment_id)
        .execute(executor)
        .await?;
    Ok(())
}
