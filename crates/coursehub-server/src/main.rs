mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use coursehub_transcription::{KvBatchLedger, RedisStore, TranscriptionClient};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::scheduler::{register_transcription_jobs, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = coursehub_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, ?config, "coursehub starting");

    let pool_config = coursehub_db::PoolConfig::from_app_config(&config);
    let pool = coursehub_db::connect_pool(&config.database_url, pool_config).await?;
    coursehub_db::run_migrations(&pool).await?;

    let ledger_store = Arc::new(RedisStore::new(&config.redis_url)?);
    if let Err(e) = ledger_store.ping().await {
        tracing::warn!(error = %e, "ledger store unreachable at startup; jobs will retry on schedule");
    }
    let ledger = KvBatchLedger::new(
        Arc::clone(&ledger_store),
        Some(Duration::from_secs(config.transcription_ledger_ttl_secs)),
    );

    let client = TranscriptionClient::new(
        config.ai_service_url.as_deref(),
        config.ai_service_timeout_secs,
    )?;
    if !client.is_configured() {
        tracing::warn!("AI_SERVICE_URL is not set; transcription runs will fail until it is");
    }

    let scheduler =
        Scheduler::with_job_timeout(Duration::from_secs(config.scheduler_job_timeout_secs));
    register_transcription_jobs(&scheduler, &pool, &ledger, &client, &config).await?;
    scheduler.start().await?;
    let jobs = scheduler.job_count().await;
    tracing::info!(
        jobs,
        submit_cron = %config.transcription_submit_cron,
        status_cron = %config.transcription_status_cron,
        "scheduler: transcription jobs running"
    );

    let app = build_app(AppState { pool, ledger_store });
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server: listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
