use std::collections::HashMap;

use coursehub_db::DbError;
use uuid::Uuid;

use crate::client::TranscriptionClient;
use crate::error::{LedgerError, TranscriptionError};
use crate::ledger::{self, BatchLedger, TranscriptionBatch};
use crate::store::CourseStore;
use crate::types::{LessonStatus, LessonStatusItem};

/// Outcome counts for one status-check run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub batches: usize,
    pub completed_batches: usize,
    pub in_progress: usize,
    pub orphaned: usize,
    pub lost: usize,
    pub failed: usize,
    pub lessons_completed: usize,
    pub lessons_failed: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct LessonTally {
    completed: usize,
    failed: usize,
    removed: usize,
    pending: usize,
}

#[derive(Debug)]
enum BatchOutcome {
    Completed(LessonTally),
    InProgress(LessonTally),
    /// Index entry without a usable record.
    Orphaned,
    /// The service answered 404 for the batch.
    Lost,
}

/// Polls outstanding batches and reconciles lesson completion.
///
/// `COMPLETED` lessons are marked transcribed, `FAILED` lessons are logged
/// and left for the next submission run to pick up again. A batch leaves the
/// ledger once none of its lessons is pending.
pub struct StatusCheckerJob<S, B> {
    store: S,
    ledger: B,
    client: TranscriptionClient,
}

impl<S: CourseStore, B: BatchLedger> StatusCheckerJob<S, B> {
    pub fn new(store: S, ledger: B, client: TranscriptionClient) -> Self {
        Self {
            store,
            ledger,
            client,
        }
    }

    /// Reconciles every active batch once.
    ///
    /// # Errors
    ///
    /// Fails before touching any batch if the active index cannot be read
    /// ([`TranscriptionError::Ledger`]) or, when there is work, the service
    /// URL is not configured ([`TranscriptionError::NotConfigured`]).
    /// Per-batch errors are counted in the summary instead.
    pub async fn run(&self) -> Result<StatusSummary, TranscriptionError> {
        let active = self.ledger.list_active().await?;
        let mut summary = StatusSummary {
            batches: active.len(),
            ..StatusSummary::default()
        };

        if active.is_empty() {
            tracing::debug!("transcription: no active batches");
            return Ok(summary);
        }

        if !self.client.is_configured() {
            tracing::error!(
                batches = active.len(),
                "transcription: AI service URL not configured; status check aborted"
            );
            return Err(TranscriptionError::NotConfigured);
        }

        for batch_id in &active {
            match self.reconcile_batch(batch_id).await {
                Ok(BatchOutcome::Completed(tally)) => {
                    summary.completed_batches += 1;
                    summary.lessons_completed += tally.completed;
                    summary.lessons_failed += tally.failed;
                }
                Ok(BatchOutcome::InProgress(tally)) => {
                    summary.in_progress += 1;
                    summary.lessons_completed += tally.completed;
                    summary.lessons_failed += tally.failed;
                }
                Ok(BatchOutcome::Orphaned) => summary.orphaned += 1,
                Ok(BatchOutcome::Lost) => summary.lost += 1,
                Err(e) => {
                    tracing::error!(
                        batch_id = %batch_id,
                        error = %e,
                        "transcription: failed to reconcile batch"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            batches = summary.batches,
            completed = summary.completed_batches,
            in_progress = summary.in_progress,
            orphaned = summary.orphaned,
            lost = summary.lost,
            failed = summary.failed,
            lessons_completed = summary.lessons_completed,
            lessons_failed = summary.lessons_failed,
            "transcription: status check finished"
        );
        Ok(summary)
    }

    async fn reconcile_batch(&self, batch_id: &str) -> Result<BatchOutcome, TranscriptionError> {
        let batch = match self.ledger.load(batch_id).await {
            Ok(Some(batch)) => batch,
            Ok(None) => {
                tracing::warn!(batch_id, "transcription: active index entry has no record; pruning");
                self.ledger.remove_active(batch_id).await?;
                return Ok(BatchOutcome::Orphaned);
            }
            Err(LedgerError::Serialize(e)) => {
                tracing::warn!(
                    batch_id,
                    error = %e,
                    "transcription: undecodable ledger record; retiring batch"
                );
                ledger::retire_batch(&self.ledger, batch_id).await?;
                return Ok(BatchOutcome::Orphaned);
            }
            Err(e) => return Err(e.into()),
        };

        let status = match self.client.batch_status(batch_id).await {
            Ok(status) => status,
            Err(TranscriptionError::BatchNotFound(_)) => {
                tracing::warn!(
                    batch_id,
                    tenant_id = %batch.tenant_id,
                    "transcription: service no longer knows batch; retiring it"
                );
                ledger::retire_batch(&self.ledger, batch_id).await?;
                return Ok(BatchOutcome::Lost);
            }
            Err(e) => return Err(e),
        };

        let reported: HashMap<Uuid, &LessonStatusItem> = status
            .lessons
            .iter()
            .map(|item| (item.lesson_id, item))
            .collect();

        let unknown = reported
            .keys()
            .filter(|id| !batch.lesson_ids.contains(*id))
            .count();
        if unknown > 0 {
            tracing::debug!(
                batch_id,
                unknown,
                "transcription: status lists lessons outside the batch; ignoring them"
            );
        }

        let mut tally = LessonTally::default();
        for lesson_id in &batch.lesson_ids {
            match reported.get(lesson_id) {
                Some(item) if item.status.is_terminal() => {
                    self.resolve_lesson(&batch, item, &mut tally).await;
                }
                _ => tally.pending += 1,
            }
        }

        if tally.pending > 0 {
            tracing::debug!(
                batch_id,
                pending = tally.pending,
                completed = tally.completed,
                "transcription: batch still in progress"
            );
            return Ok(BatchOutcome::InProgress(tally));
        }

        ledger::retire_batch(&self.ledger, batch_id).await?;
        tracing::info!(
            batch_id,
            tenant_id = %batch.tenant_id,
            completed = tally.completed,
            failed = tally.failed,
            removed = tally.removed,
            "transcription: batch finished; removed from ledger"
        );
        Ok(BatchOutcome::Completed(tally))
    }

    async fn resolve_lesson(
        &self,
        batch: &TranscriptionBatch,
        item: &LessonStatusItem,
        tally: &mut LessonTally,
    ) {
        if item.status == LessonStatus::Completed {
            self.mark_completed(batch, item.lesson_id, tally).await;
            return;
        }

        tracing::error!(
            batch_id = %batch.batch_id,
            tenant_id = %batch.tenant_id,
            lesson_id = %item.lesson_id,
            reason = item.error.as_deref().unwrap_or("no error reported"),
            "transcription: lesson transcription failed"
        );
        tally.failed += 1;
    }

    /// Marks one lesson transcribed. A write failure keeps the lesson
    /// pending so the next poll retries it.
    async fn mark_completed(
        &self,
        batch: &TranscriptionBatch,
        lesson_id: Uuid,
        tally: &mut LessonTally,
    ) {
        match self.store.set_transcription_completed(lesson_id, true).await {
            Ok(()) => tally.completed += 1,
            Err(DbError::NotFound) => {
                tracing::warn!(
                    batch_id = %batch.batch_id,
                    lesson_id = %lesson_id,
                    "transcription: completed lesson no longer exists"
                );
                tally.removed += 1;
            }
            Err(e) => {
                tracing::error!(
                    batch_id = %batch.batch_id,
                    lesson_id = %lesson_id,
                    error = %e,
                    "transcription: failed to mark lesson transcribed; retrying next poll"
                );
                tally.pending += 1;
            }
        }
    }
}
