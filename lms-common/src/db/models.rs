//! Database models
//!
//! Decimal columns are stored as TEXT and decoded through
//! [`crate::money::parse_decimal`], so rows are mapped by hand instead of
//! with `#[derive(FromRow)]`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::money::parse_decimal;

/// Status string meaning "payment completed"
pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_FAILED: &str = "failed";

/// Payment status as reported by the gateway
///
/// Unknown gateway strings are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => STATUS_PENDING,
            PaymentStatus::Success => STATUS_SUCCESS,
            PaymentStatus::Failed => STATUS_FAILED,
            PaymentStatus::Other(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

impl From<&str> for PaymentStatus {
    fn from(value: &str) -> Self {
        match value {
            STATUS_PENDING => PaymentStatus::Pending,
            STATUS_SUCCESS => PaymentStatus::Success,
            STATUS_FAILED => PaymentStatus::Failed,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        PaymentStatus::from(value.as_str())
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    parse_decimal(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn optional_decimal_column(row: &SqliteRow, column: &str) -> Result<Option<Decimal>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|r| {
        parse_decimal(&r).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
    })
    .transpose()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Amount a buyer is charged at checkout
    pub fn charged_amount(&self) -> Decimal {
        crate::money::charged_amount(self.price, self.discount_price)
    }

    /// Zero charged amount means the course is free
    pub fn is_free(&self) -> bool {
        self.charged_amount().is_zero()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Course {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            slug: row.try_get("slug")?,
            price: decimal_column(row, "price")?,
            discount_price: optional_decimal_column(row, "discount_price")?,
            is_published: row.try_get("is_published")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// One purchase attempt, keyed externally by its invoice identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: String,
    pub user_id: i64,
    pub course_id: i64,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Payment {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            invoice_id: row.try_get("invoice_id")?,
            user_id: row.try_get("user_id")?,
            course_id: row.try_get("course_id")?,
            amount: decimal_column(row, "amount")?,
            status: PaymentStatus::from(status),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Confirmed access of a user to a course
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub course_id: i64,
    pub title: String,
    pub slug: String,
    pub position: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LessonProgress {
    pub user_id: i64,
    pub lesson_id: i64,
    pub is_completed: bool,
    pub percent: i64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_round_trip() {
        for raw in ["pending", "success", "failed", "refunded"] {
            let status = PaymentStatus::from(raw);
            assert_eq!(status.as_str(), raw);
        }
        assert_eq!(PaymentStatus::from("success"), PaymentStatus::Success);
        assert_eq!(
            PaymentStatus::from("processing"),
            PaymentStatus::Other("processing".to_string())
        );
    }

    #[test]
    fn test_success_sentinel_is_exact() {
        assert!(PaymentStatus::from("success").is_success());
        assert!(!PaymentStatus::from("SUCCESS").is_success());
        assert!(!PaymentStatus::from("success ").is_success());
    }

    #[test]
    fn test_payment_status_serializes_as_string() {
        let json = serde_json::to_string(&PaymentStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
        let parsed: PaymentStatus = serde_json::from_str("\"weird\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Other("weird".to_string()));
    }
}
