//! Relational collaborators of the transcription jobs.

use std::future::Future;

use coursehub_db::{DbError, LessonRow, TenantRow};
use sqlx::PgPool;
use uuid::Uuid;

/// Tenant and lesson access needed by the jobs.
///
/// Implemented for [`PgPool`]; tests supply an in-memory implementation.
pub trait CourseStore: Send + Sync {
    fn list_tenants_with_ai_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<TenantRow>, DbError>> + Send;

    fn list_unprocessed_lessons(
        &self,
        tenant_id: Uuid,
    ) -> impl Future<Output = Result<Vec<LessonRow>, DbError>> + Send;

    /// Sets the lesson's completion flag. Returns [`DbError::NotFound`] if
    /// the lesson no longer exists.
    fn set_transcription_completed(
        &self,
        lesson_id: Uuid,
        completed: bool,
    ) -> impl Future<Output = Result<(), DbError>> + Send;
}

impl CourseStore for PgPool {
    async fn list_tenants_with_ai_enabled(&self) -> Result<Vec<TenantRow>, DbError> {
        coursehub_db::list_tenants_with_ai_enabled(self).await
    }

    async fn list_unprocessed_lessons(&self, tenant_id: Uuid) -> Result<Vec<LessonRow>, DbError> {
        coursehub_db::list_unprocessed_lessons(self, tenant_id).await
    }

    async fn set_transcription_completed(
        &self,
        lesson_id: Uuid,
        completed: bool,
    ) -> Result<(), DbError> {
        coursehub_db::set_transcription_completed(self, lesson_id, completed).await
    }
}
