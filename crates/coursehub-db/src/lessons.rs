//! Database operations for the `lessons` table.
//!
//! Only the transcription pipeline's view of a lesson lives here: the
//! pending-work query and the `transcription_completed` flag.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `lessons` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LessonRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub transcription_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Returns the tenant's live lessons that have media but no transcription yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unprocessed_lessons(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Vec<LessonRow>, DbError> {
    let rows = sqlx::query_as::<_, LessonRow>(
        "SELECT id, tenant_id, course_id, title, video_url, transcription_completed, created_at \
         FROM lessons \
         WHERE tenant_id = $1 \
           AND transcription_completed = false \
           AND video_url IS NOT NULL \
           AND deleted_at IS NULL \
         ORDER BY created_at, id",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets `lessons.transcription_completed` for one lesson.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no live lesson has this id, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_transcription_completed(
    pool: &PgPool,
    lesson_id: Uuid,
    completed: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE lessons \
         SET transcription_completed = $1, updated_at = NOW() \
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(completed)
    .bind(lesson_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
