//! Course and lesson queries

use lms_common::db::{Course, Lesson};
use lms_common::Result;
use sqlx::{Executor, Sqlite};

const COURSE_COLUMNS: &str =
    "id, title, slug, price, discount_price, is_published, created_at";

/// Published course by slug
pub async fn find_published_by_slug<'e, E>(executor: E, slug: &str) -> Result<Option<Course>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM courses WHERE slug = ? AND is_published = 1",
        COURSE_COLUMNS
    );
    let course = sqlx::query_as::<_, Course>(&sql)
        .bind(slug)
        .fetch_optional(executor)
        .await?;
    Ok(course)
}

pub async fn find_by_id<'e, E>(executor: E, course_id: i64) -> Result<Option<Course>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS);
    let course = sqlx::query_as::<_, Course>(&sql)
        .bind(course_id)
        .fetch_optional(executor)
        .await?;
    Ok(course)
}

/// Active lesson in an active module, with its course id
pub async fn find_active_lesson<'e, E>(executor: E, lesson_id: i64) -> Result<Option<Lesson>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT l.id, l.module_id, m.course_id, l.title, l.slug, l.position, l.is_active
        FROM lessons l
        JOIN modules m ON m.id = l.module_id
        WHERE l.id = ? AND l.is_active = 1 AND m.is_active = 1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await?;
    Ok(lesson)
}

/// Slug of the first active lesson, ordered by module then lesson position
pub async fn first_lesson_slug<'e, E>(executor: E, course_id: i64) -> Result<Option<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let slug: Option<String> = sqlx::query_scalar(
        r#"
        SELECT l.slug
        FROM lessons l
        JOIN modules m ON m.id = l.module_id
        WHERE m.course_id = ? AND l.is_active = 1 AND m.is_active = 1
        ORDER BY m.position, l.position, l.id
        LIMIT 1
        "#,
    )
    .bind(course_id)
    .fetch_optional(executor)
    .await?;
    Ok(slug)
}

/// Number of active lessons in a course
pub async fn count_active_lessons<'e, E>(executor: E, course_id: i64) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM lessons l
        JOIN modules m ON m.id = l.module_id
        WHERE m.course_id = ? AND l.is_active = 1 AND m.is_active = 1
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await?;
    Ok(count)
}
