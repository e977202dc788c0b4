//! Lesson progress tracking
//!
//! Progress is monotonic per (user, lesson). When an enrolled user has
//! completed every active lesson of a course, the enrollment's completion
//! flag is set; it is never cleared again.

use lms_common::db::LessonProgress;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{begin_write, courses, enrollments, progress, users};
use crate::error::{ApiError, ApiResult};

/// Clamp a reported percentage into 0..=100
pub fn clamp_percent(percent: i64) -> i64 {
    percent.clamp(0, 100)
}

#[derive(Debug, Clone)]
pub struct ProgressOutcome {
    pub progress: LessonProgress,
    pub course_id: i64,
    /// True only on the update that finished the course
    pub course_completed: bool,
}

/// Record a progress report for one lesson
pub async fn record_progress(
    pool: &SqlitePool,
    user_id: i64,
    lesson_id: i64,
    percent: i64,
    is_completed: bool,
) -> ApiResult<ProgressOutcome> {
    let mut tx = begin_write(pool).await?;

    if users::find_by_id(&mut *tx, user_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    let lesson = courses::find_active_lesson(&mut *tx, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
    let course = courses::find_by_id(&mut *tx, lesson.course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrollment = enrollments::find(&mut *tx, user_id, course.id).await?;
    if enrollment.is_none() && !course.is_free() {
        return Err(ApiError::Forbidden("No access to this lesson".to_string()));
    }

    let percent = clamp_percent(percent);
    let completed = is_completed || percent == 100;
    let progress = progress::upsert(&mut *tx, user_id, lesson.id, percent, completed).await?;

    // Only an enrolled, not yet finished course can flip to completed
    let mut course_completed = false;
    let pending_completion = enrollment.as_ref().is_some_and(|e| !e.completed);
    if pending_completion && progress.is_completed {
        let total = courses::count_active_lessons(&mut *tx, course.id).await?;
        let done = progress::count_completed(&mut *tx, user_id, course.id).await?;
        if total > 0 && done >= total {
            course_completed = enrollments::mark_completed(&mut *tx, user_id, course.id).await?;
        }
    }

    tx.commit().await?;

    if course_completed {
        info!(user_id, course_id = course.id, "Course completed");
    }

    Ok(ProgressOutcome {
        progress,
        course_id: course.id,
        course_completed,
    })
}
