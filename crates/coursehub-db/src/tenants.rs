//! Database operations for the `tenants` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `tenants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub ai_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Returns every tenant whose AI features are enabled, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_tenants_with_ai_enabled(pool: &PgPool) -> Result<Vec<TenantRow>, DbError> {
    let rows = sqlx::query_as::<_, TenantRow>(
        "SELECT id, name, slug, ai_enabled, created_at \
         FROM tenants \
         WHERE ai_enabled = true \
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
