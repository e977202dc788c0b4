//! Access and learning endpoints
//!
//! Every answer about "who has access" is read from the enrollments table.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::enrollments::{self, EnrolledCourse};
use crate::db::{bounded, courses};
use crate::error::{ApiError, ApiResult};
use crate::services::{course_students, has_access, record_progress};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MyCoursesResponse {
    pub in_progress: Vec<EnrolledCourse>,
    pub completed: Vec<EnrolledCourse>,
}

/// GET /api/users/:user_id/courses
pub async fn my_courses(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<MyCoursesResponse>> {
    let rows = bounded("list enrollments", state.db_timeout, async {
        enrollments::list_for_user(&state.db, user_id)
            .await
            .map_err(ApiError::from)
    })
    .await?;

    let (completed, in_progress): (Vec<_>, Vec<_>) = rows.into_iter().partition(|e| e.completed);
    Ok(Json(MyCoursesResponse {
        in_progress,
        completed,
    }))
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub has_access: bool,
}

/// GET /api/users/:user_id/access/:course_slug
pub async fn course_access(
    State(state): State<AppState>,
    Path((user_id, course_slug)): Path<(i64, String)>,
) -> ApiResult<Json<AccessResponse>> {
    let granted = bounded("access check", state.db_timeout, async {
        let mut conn = state.db.acquire().await?;
        let course = courses::find_published_by_slug(&mut *conn, &course_slug)
            .await?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
        Ok::<_, ApiError>(has_access(&mut *conn, user_id, course.id).await?)
    })
    .await?;

    Ok(Json(AccessResponse {
        has_access: granted,
    }))
}

#[derive(Debug, Serialize)]
pub struct StudentsResponse {
    pub course_slug: String,
    pub count: usize,
    pub user_ids: Vec<i64>,
}

/// GET /api/courses/:course_slug/students
pub async fn students(
    State(state): State<AppState>,
    Path(course_slug): Path<String>,
) -> ApiResult<Json<StudentsResponse>> {
    let user_ids = bounded("list students", state.db_timeout, async {
        let mut conn = state.db.acquire().await?;
        let course = courses::find_published_by_slug(&mut *conn, &course_slug)
            .await?
            .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
        Ok::<_, ApiError>(course_students(&mut *conn, course.id).await?)
    })
    .await?;

    Ok(Json(StudentsResponse {
        course_slug,
        count: user_ids.len(),
        user_ids,
    }))
}

/// Body of `POST /api/progress`
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub user_id: i64,
    pub lesson_id: i64,
    #[serde(default)]
    pub percent: i64,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub lesson_id: i64,
    pub percent: i64,
    pub is_completed: bool,
    pub course_completed: bool,
}

/// POST /api/progress
pub async fn update_progress(
    State(state): State<AppState>,
    Json(req): Json<ProgressRequest>,
) -> ApiResult<Json<ProgressResponse>> {
    let outcome = bounded(
        "record progress",
        state.db_timeout,
        record_progress(
            &state.db,
            req.user_id,
            req.lesson_id,
            req.percent,
            req.is_completed,
        ),
    )
    .await?;

    Ok(Json(ProgressResponse {
        lesson_id: outcome.progress.lesson_id,
        percent: outcome.progress.percent,
        is_completed: outcome.progress.is_completed,
        course_completed: outcome.course_completed,
    }))
}
