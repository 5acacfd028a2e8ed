//! Offline unit tests for coursehub-db pool configuration and row types.
//! These tests do not require a live database connection.

use coursehub_core::{AppConfig, Environment};
use coursehub_db::{DbError, LessonRow, PoolConfig, TenantRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        ai_service_url: None,
        ai_service_timeout_secs: 60,
        transcription_submit_cron: "0 0 3 * * *".to_string(),
        transcription_status_cron: "0 */10 * * * *".to_string(),
        scheduler_job_timeout_secs: 1800,
        transcription_ledger_ttl_secs: 604_800,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`LessonRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn lesson_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = LessonRow {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        course_id: Uuid::new_v4(),
        title: "Intro to sourdough".to_string(),
        video_url: Some("https://cdn.example.com/lessons/1.mp4".to_string()),
        transcription_completed: false,
        created_at: Utc::now(),
    };

    assert_eq!(row.title, "Intro to sourdough");
    assert!(row.video_url.is_some());
    assert!(!row.transcription_completed);
}

#[test]
fn tenant_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = TenantRow {
        id: Uuid::new_v4(),
        name: "Bakery Academy".to_string(),
        slug: "bakery-academy".to_string(),
        ai_enabled: true,
        created_at: Utc::now(),
    };

    assert_eq!(row.slug, "bakery-academy");
    assert!(row.ai_enabled);
}

#[test]
fn not_found_error_message() {
    assert_eq!(DbError::NotFound.to_string(), "record not found");
}

#[tokio::test]
async fn run_migrations_wraps_failures_as_migration_error() {
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://coursehub@127.0.0.1:1/coursehub")
        .expect("lazy pool");

    let err = coursehub_db::run_migrations(&pool).await.unwrap_err();

    assert!(matches!(err, DbError::Migration(_)), "got: {err:?}");
}
