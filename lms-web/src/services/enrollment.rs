//! Enrollment state updater
//!
//! Grants a user access to a course. Access has a single source of truth,
//! the enrollments table: "has access" and "list of students" are both
//! queries over it, so there is no second marker to keep in sync.

use lms_common::Result;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::db::enrollments;

/// Result of a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new enrollment row was written
    Created,
    /// The pair already had access; nothing changed
    AlreadyEnrolled,
}

impl GrantOutcome {
    pub fn created(self) -> bool {
        matches!(self, GrantOutcome::Created)
    }
}

/// Ensure an enrollment exists for (user, course)
///
/// Idempotent: a second call for the same pair returns
/// [`GrantOutcome::AlreadyEnrolled`] and leaves the existing row, including
/// its completion flag, untouched. Takes a connection so callers can run it
/// inside their own transaction.
pub async fn grant_access(
    conn: &mut SqliteConnection,
    user_id: i64,
    course_id: i64,
) -> Result<GrantOutcome> {
    if enrollments::insert_if_absent(&mut *conn, user_id, course_id).await? {
        info!(user_id, course_id, "Enrollment created");
        Ok(GrantOutcome::Created)
    } else {
        debug!(user_id, course_id, "Enrollment already present");
        Ok(GrantOutcome::AlreadyEnrolled)
    }
}

pub async fn has_access(conn: &mut SqliteConnection, user_id: i64, course_id: i64) -> Result<bool> {
    enrollments::exists(conn, user_id, course_id).await
}

/// Users with access to a course
pub async fn course_students(conn: &mut SqliteConnection, course_id: i64) -> Result<Vec<i64>> {
    enrollments::course_students(conn, course_id).await
}
