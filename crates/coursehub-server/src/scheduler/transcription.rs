use std::sync::Arc;

use coursehub_core::AppConfig;
use coursehub_transcription::{
    BatchLedger, CourseStore, StatusCheckerJob, SubmissionJob, TranscriptionClient,
};
use futures::future::BoxFuture;
use sqlx::PgPool;

use super::{Job, JobContext, ScheduleError, Scheduler};

const SUBMISSION_JOB: &str = "transcription_submission";
const STATUS_CHECKER_JOB: &str = "transcription_status_checker";

impl<S, B> Job for SubmissionJob<S, B>
where
    S: CourseStore + 'static,
    B: BatchLedger + 'static,
{
    fn name(&self) -> &'static str {
        SUBMISSION_JOB
    }

    fn execute<'a>(&'a self, _ctx: &'a JobContext) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.run().await?;
            Ok(())
        })
    }
}

impl<S, B> Job for StatusCheckerJob<S, B>
where
    S: CourseStore + 'static,
    B: BatchLedger + 'static,
{
    fn name(&self) -> &'static str {
        STATUS_CHECKER_JOB
    }

    fn execute<'a>(&'a self, _ctx: &'a JobContext) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.run().await?;
            Ok(())
        })
    }
}

/// Registers the submission and status-checker jobs on their configured
/// cron expressions.
///
/// # Errors
///
/// Returns [`ScheduleError`] if either cron expression is invalid or the
/// scheduler rejects a job.
pub async fn register_transcription_jobs<B>(
    scheduler: &Scheduler,
    pool: &PgPool,
    ledger: &B,
    client: &TranscriptionClient,
    config: &AppConfig,
) -> Result<(), ScheduleError>
where
    B: BatchLedger + Clone + 'static,
{
    let submission = SubmissionJob::new(pool.clone(), ledger.clone(), client.clone());
    scheduler
        .add_job(Arc::new(submission), &config.transcription_submit_cron)
        .await?;

    let status = StatusCheckerJob::new(pool.clone(), ledger.clone(), client.clone());
    scheduler
        .add_job(Arc::new(status), &config.transcription_status_cron)
        .await?;

    Ok(())
}
