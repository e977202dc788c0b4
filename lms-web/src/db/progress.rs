//! Lesson progress queries

use lms_common::db::LessonProgress;
use lms_common::Result;
use sqlx::{Executor, Sqlite};

/// Record progress, keeping the best value seen so far
///
/// `percent` only grows and `is_completed` only moves false -> true, so a
/// late or replayed update never loses progress.
pub async fn upsert<'e, E>(
    executor: E,
    user_id: i64,
    lesson_id: i64,
    percent: i64,
    is_completed: bool,
) -> Result<LessonProgress>
where
    E: Executor<'e, Database = Sqlite>,
{
    let progress = sqlx::query_as::<_, LessonProgress>(
        r#"
        INSERT INTO lesson_progress (user_id, lesson_id, percent, is_completed)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, lesson_id) DO UPDATE SET
            percent = MAX(lesson_progress.percent, excluded.percent),
            is_completed = MAX(lesson_progress.is_completed, excluded.is_completed),
            updated_at = CURRENT_TIMESTAMP
        RETURNING user_id, lesson_id, is_completed, percent, updated_at
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(percent)
    .bind(is_completed)
    .fetch_one(executor)
    .await?;
    Ok(progress)
}

/// Completed active lessons of a course for one user
pub async fn count_completed<'e, E>(executor: E, user_id: i64, course_id: i64) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM lesson_progress p
        JOIN lessons l ON l.id = p.lesson_id
        JOIN modules m ON m.id = l.module_id
        WHERE p.user_id = ? AND m.course_id = ? AND p.is_completed = 1
          AND l.is_active = 1 AND m.is_active = 1
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await?;
    Ok(count)
}
