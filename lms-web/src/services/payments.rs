//! Payment reconciliation
//!
//! Applies a verified gateway notification to the matching payment:
//! lock -> look up -> validate amount -> check transition -> persist status
//! -> grant access, all inside one SQLite transaction. Any early return
//! drops the transaction, which rolls it back, so a rejected notification
//! never leaves a partial write.

use lms_common::db::PaymentStatus;
use lms_common::money::amount_from_json;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::payments;
use crate::services::enrollment::{grant_access, GrantOutcome};

// ============================================================================
// Notification
// ============================================================================

/// Gateway notification body: `{"invoiceId", "status", "amount"}`
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub invoice_id: String,
    pub status: PaymentStatus,
    /// Raw amount; converted to a decimal only once the payment is found
    pub amount: Value,
}

impl Notification {
    /// Parse a raw body
    ///
    /// Returns `None` for anything that is not a JSON object with string
    /// `invoiceId` and `status` fields. A missing amount is `null`.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let obj = value.as_object()?;
        let invoice_id = obj.get("invoiceId")?.as_str()?.to_string();
        let status = obj.get("status")?.as_str()?;
        Some(Self {
            invoice_id,
            status: PaymentStatus::from(status),
            amount: obj.get("amount").cloned().unwrap_or(Value::Null),
        })
    }
}

// ============================================================================
// Errors and outcome
// ============================================================================

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No payment carries the notified invoice id
    #[error("Payment not found")]
    NotFound,

    /// Amount present but not a decimal
    #[error("Invalid amount format")]
    InvalidAmountFormat,

    /// Notified amount below the recorded amount
    #[error("Underpaid: expected {expected}, notified {notified}")]
    Underpaid { expected: Decimal, notified: Decimal },

    /// Notified status would move a settled payment away from success
    #[error("Invalid status transition {from} -> {to}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },

    #[error(transparent)]
    Storage(#[from] lms_common::Error),
}

impl From<sqlx::Error> for ReconcileError {
    fn from(err: sqlx::Error) -> Self {
        ReconcileError::Storage(lms_common::Error::Database(err))
    }
}

/// What a status notification does to the stored status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Notified status equals the stored one (gateway retry)
    Unchanged,
    /// Stored status is replaced by the notified one
    Apply,
}

/// Decide whether `current -> notified` is allowed
///
/// Success is terminal: once a payment is settled, only a replay of
/// `success` is accepted. Every other status is replaced verbatim by
/// whatever the gateway reports.
pub fn plan_transition(
    current: &PaymentStatus,
    notified: &PaymentStatus,
) -> Result<Transition, ReconcileError> {
    if current == notified {
        return Ok(Transition::Unchanged);
    }
    if current.is_success() {
        return Err(ReconcileError::InvalidTransition {
            from: current.clone(),
            to: notified.clone(),
        });
    }
    Ok(Transition::Apply)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub payment_id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub status: PaymentStatus,
    pub transition: Transition,
    /// Set when the notification reported success
    pub grant: Option<GrantOutcome>,
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Apply a verified notification atomically
pub async fn reconcile(
    pool: &SqlitePool,
    notification: &Notification,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut tx = pool.begin().await?;

    // Write lock first; a concurrent notification for this invoice waits here
    if !payments::lock_by_invoice(&mut *tx, &notification.invoice_id).await? {
        return Err(ReconcileError::NotFound);
    }
    let payment = payments::find_by_invoice(&mut *tx, &notification.invoice_id)
        .await?
        .ok_or(ReconcileError::NotFound)?;

    let notified_amount =
        amount_from_json(&notification.amount).map_err(|_| ReconcileError::InvalidAmountFormat)?;
    if let Some(notified) = notified_amount {
        if notified < payment.amount {
            warn!(
                invoice_id = %payment.invoice_id,
                expected = %payment.amount,
                notified = %notified,
                "Rejected underpaid notification"
            );
            return Err(ReconcileError::Underpaid {
                expected: payment.amount,
                notified,
            });
        }
    }

    let transition = match plan_transition(&payment.status, &notification.status) {
        Ok(t) => t,
        Err(e) => {
            warn!(invoice_id = %payment.invoice_id, "{}", e);
            return Err(e);
        }
    };
    if transition == Transition::Apply {
        payments::update_status(&mut *tx, payment.id, &notification.status).await?;
    }

    let grant = if notification.status.is_success() {
        Some(grant_access(&mut *tx, payment.user_id, payment.course_id).await?)
    } else {
        None
    };

    tx.commit().await?;

    info!(
        invoice_id = %payment.invoice_id,
        from = %payment.status,
        to = %notification.status,
        ?transition,
        "Payment notification applied"
    );

    Ok(ReconcileOutcome {
        payment_id: payment.id,
        user_id: payment.user_id,
        course_id: payment.course_id,
        status: notification.status.clone(),
        transition,
        grant,
    })
}
