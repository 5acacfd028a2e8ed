//! Background job scheduler.
//!
//! [`Scheduler`] owns a cron driver ([`JobScheduler`]) plus the list of
//! registered jobs. Every firing runs under a deadline and its outcome is
//! logged, never propagated: a failing or stuck job cannot stop the driver
//! or other jobs. `stop()` shuts the driver down and then waits for running
//! invocations to return.

mod transcription;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};
use uuid::Uuid;

pub use transcription::register_transcription_jobs;

/// Default per-invocation deadline.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A named unit of recurring work.
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn execute<'a>(&'a self, ctx: &'a JobContext) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Per-invocation context handed to [`Job::execute`].
#[derive(Debug, Clone)]
pub struct JobContext {
    pub run_id: Uuid,
    pub deadline: Instant,
}

impl JobContext {
    fn new(timeout: Duration) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            deadline: Instant::now() + timeout,
        }
    }

    /// Time left before the scheduler abandons this invocation.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// A job registered against a cron expression.
struct ScheduledJob {
    job: Arc<dyn Job>,
    cron: String,
}

struct SchedulerState {
    /// `Some` while running.
    driver: Option<JobScheduler>,
    jobs: Vec<ScheduledJob>,
}

pub struct Scheduler {
    state: Mutex<SchedulerState>,
    job_timeout: Duration,
    in_flight: Arc<watch::Sender<usize>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_job_timeout(DEFAULT_JOB_TIMEOUT)
    }

    #[must_use]
    pub fn with_job_timeout(job_timeout: Duration) -> Self {
        let (in_flight, _) = watch::channel(0_usize);
        Self {
            state: Mutex::new(SchedulerState {
                driver: None,
                jobs: Vec::new(),
            }),
            job_timeout,
            in_flight: Arc::new(in_flight),
        }
    }

    /// Registers `job` to run on `cron` (six fields, seconds first, UTC).
    ///
    /// Jobs added while running are scheduled immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidCron`] if the expression does not
    /// parse, or [`ScheduleError::Scheduler`] if the running driver rejects
    /// the job.
    pub async fn add_job(&self, job: Arc<dyn Job>, cron: &str) -> Result<(), ScheduleError> {
        let cron_job = self.cron_job(&job, cron)?;

        let mut state = self.state.lock().await;
        if let Some(driver) = &state.driver {
            driver.add(cron_job).await?;
        }

        tracing::info!(job = job.name(), cron, "scheduler: job scheduled");
        state.jobs.push(ScheduledJob {
            job,
            cron: cron.to_string(),
        });
        Ok(())
    }

    /// Starts the cron driver. A no-op when already running.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if the driver cannot be created or started.
    pub async fn start(&self) -> Result<(), ScheduleError> {
        let mut state = self.state.lock().await;
        if state.driver.is_some() {
            tracing::debug!("scheduler: start requested while running; ignoring");
            return Ok(());
        }

        let driver = JobScheduler::new().await?;
        for scheduled in &state.jobs {
            driver
                .add(self.cron_job(&scheduled.job, &scheduled.cron)?)
                .await?;
        }
        driver.start().await?;

        tracing::info!(jobs = state.jobs.len(), "scheduler: started");
        state.driver = Some(driver);
        Ok(())
    }

    /// Stops the cron driver and waits for running invocations to finish.
    /// A no-op when already stopped.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Scheduler`] if the driver fails to shut down.
    /// Running invocations are still drained first.
    pub async fn stop(&self) -> Result<(), ScheduleError> {
        let mut state = self.state.lock().await;
        let Some(mut driver) = state.driver.take() else {
            return Ok(());
        };

        tracing::info!("scheduler: stopping; waiting for running jobs");
        let shutdown = driver.shutdown().await;

        let mut in_flight = self.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = in_flight.wait_for(|running| *running == 0).await;

        shutdown?;
        tracing::info!("scheduler: stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.driver.is_some()
    }

    pub async fn job_count(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    /// Wraps `job` in a cron callback with deadline, logging, and in-flight
    /// tracking.
    fn cron_job(
        &self,
        job: &Arc<dyn Job>,
        cron: &str,
    ) -> Result<tokio_cron_scheduler::Job, ScheduleError> {
        let job = Arc::clone(job);
        let timeout = self.job_timeout;
        let in_flight = Arc::clone(&self.in_flight);

        tokio_cron_scheduler::Job::new_async(cron, move |_uuid, _lock| {
            let guard = InFlightGuard::enter(&in_flight);
            let job = Arc::clone(&job);

            Box::pin(async move {
                let _guard = guard;
                run_with_deadline(job.as_ref(), timeout).await;
            })
        })
        .map_err(|e| ScheduleError::InvalidCron {
            expression: cron.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Counts one running invocation for as long as it is alive.
struct InFlightGuard(Arc<watch::Sender<usize>>);

impl InFlightGuard {
    fn enter(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|running| *running += 1);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|running| *running = running.saturating_sub(1));
    }
}

async fn run_with_deadline(job: &dyn Job, timeout: Duration) {
    let ctx = JobContext::new(timeout);
    let name = job.name();
    let started = std::time::Instant::now();
    tracing::info!(job = name, run_id = %ctx.run_id, "scheduler: job started");

    let outcome = tokio::time::timeout(timeout, job.execute(&ctx)).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(Ok(())) => {
            tracing::info!(
                job = name,
                run_id = %ctx.run_id,
                elapsed_ms,
                "scheduler: job executed successfully"
            );
        }
        Ok(Err(e)) => {
            tracing::error!(
                job = name,
                run_id = %ctx.run_id,
                elapsed_ms,
                "scheduler: job execution failed: {name} - {e:#}"
            );
        }
        Err(_) => {
            tracing::error!(
                job = name,
                run_id = %ctx.run_id,
                timeout_secs = timeout.as_secs(),
                "scheduler: job execution failed: {name} - deadline exceeded"
            );
        }
    }
}
