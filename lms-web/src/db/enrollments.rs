//! Enrollment queries
//!
//! The enrollments table is the only record of course access. Student lists
//! and access checks are derived from it by query.

use chrono::{DateTime, Utc};
use lms_common::db::Enrollment;
use lms_common::Result;
use serde::Serialize;
use sqlx::{Executor, FromRow, Sqlite};

/// Insert the (user, course) pair unless it already exists
///
/// Returns `true` when a row was created. An existing row is left untouched,
/// including its `completed` flag.
pub async fn insert_if_absent<'e, E>(executor: E, user_id: i64, course_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO enrollments (user_id, course_id) VALUES (?, ?) \
         ON CONFLICT (user_id, course_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(course_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find<'e, E>(executor: E, user_id: i64, course_id: i64) -> Result<Option<Enrollment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let enrollment = sqlx::query_as::<_, Enrollment>(
        "SELECT id, user_id, course_id, completed, created_at \
         FROM enrollments WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await?;
    Ok(enrollment)
}

pub async fn exists<'e, E>(executor: E, user_id: i64, course_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM enrollments WHERE user_id = ? AND course_id = ?")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(executor)
            .await?;
    Ok(found.is_some())
}

/// Flip `completed` to true; never resets it
pub async fn mark_completed<'e, E>(executor: E, user_id: i64, course_id: i64) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE enrollments SET completed = 1 \
         WHERE user_id = ? AND course_id = ? AND completed = 0",
    )
    .bind(user_id)
    .bind(course_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Enrollment joined with its course, for the "my courses" listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrolledCourse {
    pub course_id: i64,
    pub slug: String,
    pub title: String,
    pub completed: bool,
    pub enrolled_at: DateTime<Utc>,
}

/// All enrollments of a user, newest first
pub async fn list_for_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<EnrolledCourse>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, EnrolledCourse>(
        r#"
        SELECT c.id AS course_id, c.slug, c.title, e.completed, e.created_at AS enrolled_at
        FROM enrollments e
        JOIN courses c ON c.id = e.course_id
        WHERE e.user_id = ?
        ORDER BY e.created_at DESC, e.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

/// User ids enrolled in a course, in enrollment order
pub async fn course_students<'e, E>(executor: E, course_id: i64) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT user_id FROM enrollments WHERE course_id = ? ORDER BY id")
            .bind(course_id)
            .fetch_all(executor)
            .await?;
    Ok(ids)
}
