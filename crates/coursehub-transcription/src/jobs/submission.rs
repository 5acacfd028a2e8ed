use chrono::Utc;
use coursehub_db::TenantRow;

use crate::client::TranscriptionClient;
use crate::error::TranscriptionError;
use crate::ledger::{self, BatchLedger, TranscriptionBatch};
use crate::store::CourseStore;
use crate::types::SubmitBatchRequest;

/// Outcome counts for one submission run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    pub tenants: usize,
    pub submitted: usize,
    pub lessons_submitted: usize,
    pub skipped_active: usize,
    pub skipped_empty: usize,
    pub failed: usize,
}

#[derive(Debug)]
enum TenantOutcome {
    Submitted { batch_id: String, lessons: usize },
    ActiveBatch(String),
    NothingToSubmit,
}

/// Submits untranscribed lessons, one batch per AI-enabled tenant.
///
/// A tenant with an outstanding batch in the ledger is skipped, so at most
/// one batch per tenant is ever in flight. Per-tenant failures are logged
/// and never retried within the run.
pub struct SubmissionJob<S, B> {
    store: S,
    ledger: B,
    client: TranscriptionClient,
}

impl<S: CourseStore, B: BatchLedger> SubmissionJob<S, B> {
    pub fn new(store: S, ledger: B, client: TranscriptionClient) -> Self {
        Self {
            store,
            ledger,
            client,
        }
    }

    /// Visits every AI-enabled tenant once.
    ///
    /// # Errors
    ///
    /// Fails before touching any tenant if the service URL is not
    /// configured ([`TranscriptionError::NotConfigured`]) or the tenant list
    /// cannot be loaded ([`TranscriptionError::Store`]). Per-tenant errors
    /// are counted in the summary instead.
    pub async fn run(&self) -> Result<SubmissionSummary, TranscriptionError> {
        if !self.client.is_configured() {
            tracing::error!("transcription: AI service URL not configured; submission run aborted");
            return Err(TranscriptionError::NotConfigured);
        }

        let tenants = self.store.list_tenants_with_ai_enabled().await?;
        let mut summary = SubmissionSummary {
            tenants: tenants.len(),
            ..SubmissionSummary::default()
        };

        if tenants.is_empty() {
            tracing::info!("transcription: no AI-enabled tenants; nothing to submit");
            return Ok(summary);
        }

        for tenant in &tenants {
            match self.submit_for_tenant(tenant).await {
                Ok(TenantOutcome::Submitted { batch_id, lessons }) => {
                    tracing::info!(
                        tenant_id = %tenant.id,
                        batch_id = %batch_id,
                        lessons,
                        "transcription: batch submitted"
                    );
                    summary.submitted += 1;
                    summary.lessons_submitted += lessons;
                }
                Ok(TenantOutcome::ActiveBatch(batch_id)) => {
                    tracing::info!(
                        tenant_id = %tenant.id,
                        batch_id = %batch_id,
                        "transcription: tenant already has an active batch; skipping"
                    );
                    summary.skipped_active += 1;
                }
                Ok(TenantOutcome::NothingToSubmit) => {
                    tracing::debug!(
                        tenant_id = %tenant.id,
                        "transcription: no unprocessed lessons"
                    );
                    summary.skipped_empty += 1;
                }
                Err(e) => {
                    tracing::error!(
                        tenant_id = %tenant.id,
                        tenant = %tenant.slug,
                        error = %e,
                        "transcription: submission failed for tenant"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            tenants = summary.tenants,
            submitted = summary.submitted,
            lessons = summary.lessons_submitted,
            skipped_active = summary.skipped_active,
            skipped_empty = summary.skipped_empty,
            failed = summary.failed,
            "transcription: submission run finished"
        );
        Ok(summary)
    }

    async fn submit_for_tenant(
        &self,
        tenant: &TenantRow,
    ) -> Result<TenantOutcome, TranscriptionError> {
        if let Some(active) = ledger::find_active_batch_for_tenant(&self.ledger, tenant.id).await? {
            return Ok(TenantOutcome::ActiveBatch(active.batch_id));
        }

        let lessons = self.store.list_unprocessed_lessons(tenant.id).await?;
        if lessons.is_empty() {
            return Ok(TenantOutcome::NothingToSubmit);
        }

        let request = SubmitBatchRequest::new(tenant.id, &lessons);
        let batch_id = self.client.submit_batch(&request).await?;

        let batch = TranscriptionBatch {
            batch_id,
            tenant_id: tenant.id,
            lesson_ids: request.lesson_ids(),
            created_at: Utc::now(),
        };

        if let Err(e) = ledger::register_batch(&self.ledger, &batch).await {
            tracing::error!(
                tenant_id = %tenant.id,
                batch_id = %batch.batch_id,
                error = %e,
                "transcription: batch submitted but not recorded; lessons will be resubmitted"
            );
            return Err(e.into());
        }

        Ok(TenantOutcome::Submitted {
            batch_id: batch.batch_id,
            lessons: batch.lesson_ids.len(),
        })
    }
}
