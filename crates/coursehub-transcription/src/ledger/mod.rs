//! Cache-backed ledger of outstanding transcription batches.
//!
//! Two kinds of keys are kept:
//!
//! - `transcription:job:{batch_id}` holds one JSON [`TranscriptionBatch`]
//!   and expires after the configured record TTL.
//! - `transcription:jobs:list` holds a JSON array of active batch ids and
//!   never expires.
//!
//! The two keys are updated without a transaction. Readers must treat an
//! index entry with no record (or a record with no index entry) as already
//! resolved. The ledger is a pending-work index only: lesson completion is
//! owned by the relational store.

mod store;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

pub use store::{KeyValueStore, MemoryStore, RedisStore};

pub const ACTIVE_INDEX_KEY: &str = "transcription:jobs:list";

#[must_use]
pub fn batch_key(batch_id: &str) -> String {
    format!("transcription:job:{batch_id}")
}

/// One outstanding submission to the transcription service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscriptionBatch {
    pub batch_id: String,
    pub tenant_id: Uuid,
    pub lesson_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Typed access to batch records and the active-batch index.
pub trait BatchLedger: Send + Sync {
    fn save(
        &self,
        batch: &TranscriptionBatch,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn load(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<Option<TranscriptionBatch>, LedgerError>> + Send;

    fn delete(&self, batch_id: &str) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn list_active(&self) -> impl Future<Output = Result<Vec<String>, LedgerError>> + Send;

    /// Adds `batch_id` to the index. Adding an id twice keeps one entry.
    fn add_active(&self, batch_id: &str) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Removes `batch_id` from the index. Removing an absent id is a no-op.
    fn remove_active(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// [`BatchLedger`] over any [`KeyValueStore`].
pub struct KvBatchLedger<S> {
    store: Arc<S>,
    record_ttl: Option<Duration>,
}

impl<S> Clone for KvBatchLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            record_ttl: self.record_ttl,
        }
    }
}

impl<S: KeyValueStore> KvBatchLedger<S> {
    pub fn new(store: Arc<S>, record_ttl: Option<Duration>) -> Self {
        Self { store, record_ttl }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn write_index(&self, ids: &[String]) -> Result<(), LedgerError> {
        if ids.is_empty() {
            return self.store.delete(ACTIVE_INDEX_KEY).await;
        }
        let payload = serde_json::to_string(ids)?;
        self.store.set(ACTIVE_INDEX_KEY, &payload, None).await
    }
}

impl<S: KeyValueStore> BatchLedger for KvBatchLedger<S> {
    async fn save(&self, batch: &TranscriptionBatch) -> Result<(), LedgerError> {
        let payload = serde_json::to_string(batch)?;
        self.store
            .set(&batch_key(&batch.batch_id), &payload, self.record_ttl)
            .await
    }

    async fn load(&self, batch_id: &str) -> Result<Option<TranscriptionBatch>, LedgerError> {
        match self.store.get(&batch_key(batch_id)).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, batch_id: &str) -> Result<(), LedgerError> {
        self.store.delete(&batch_key(batch_id)).await
    }

    async fn list_active(&self) -> Result<Vec<String>, LedgerError> {
        match self.store.get(ACTIVE_INDEX_KEY).await? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    async fn add_active(&self, batch_id: &str) -> Result<(), LedgerError> {
        let mut ids = self.list_active().await?;
        if ids.iter().any(|id| id == batch_id) {
            return Ok(());
        }
        ids.push(batch_id.to_string());
        self.write_index(&ids).await
    }

    async fn remove_active(&self, batch_id: &str) -> Result<(), LedgerError> {
        let mut ids = self.list_active().await?;
        let before = ids.len();
        ids.retain(|id| id != batch_id);
        if ids.len() == before {
            return Ok(());
        }
        self.write_index(&ids).await
    }
}

/// Returns the tenant's outstanding batch, if any.
///
/// Index entries whose record is gone or undecodable are skipped here; the
/// status checker prunes them.
///
/// # Errors
///
/// Returns [`LedgerError`] if the index cannot be read or the store fails.
pub async fn find_active_batch_for_tenant<B: BatchLedger>(
    ledger: &B,
    tenant_id: Uuid,
) -> Result<Option<TranscriptionBatch>, LedgerError> {
    for batch_id in ledger.list_active().await? {
        match ledger.load(&batch_id).await {
            Ok(Some(batch)) if batch.tenant_id == tenant_id => return Ok(Some(batch)),
            Ok(_) => {}
            Err(LedgerError::Serialize(e)) => {
                tracing::warn!(
                    batch_id,
                    error = %e,
                    "transcription: undecodable ledger record; skipping"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

/// Records a newly submitted batch: the record first, then the index entry.
///
/// # Errors
///
/// Returns [`LedgerError`] if either write fails.
pub async fn register_batch<B: BatchLedger>(
    ledger: &B,
    batch: &TranscriptionBatch,
) -> Result<(), LedgerError> {
    ledger.save(batch).await?;
    ledger.add_active(&batch.batch_id).await
}

/// Drops a finished batch: the record first, then the index entry.
///
/// # Errors
///
/// Returns [`LedgerError`] if either write fails.
pub async fn retire_batch<B: BatchLedger>(ledger: &B, batch_id: &str) -> Result<(), LedgerError> {
    ledger.delete(batch_id).await?;
    ledger.remove_active(batch_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> KvBatchLedger<MemoryStore> {
        KvBatchLedger::new(Arc::new(MemoryStore::new()), None)
    }

    fn batch(batch_id: &str, tenant_id: Uuid) -> TranscriptionBatch {
        TranscriptionBatch {
            batch_id: batch_id.to_string(),
            tenant_id,
            lesson_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_writes_record_and_index() {
        let ledger = ledger();
        let b = batch("b-1", Uuid::new_v4());

        register_batch(&ledger, &b).await.unwrap();

        assert_eq!(ledger.load("b-1").await.unwrap(), Some(b));
        assert_eq!(ledger.list_active().await.unwrap(), vec!["b-1".to_string()]);
        assert!(ledger.store().exists(&batch_key("b-1")).await.unwrap());
    }

    #[tokio::test]
    async fn add_active_does_not_duplicate() {
        let ledger = ledger();
        ledger.add_active("b-1").await.unwrap();
        ledger.add_active("b-2").await.unwrap();
        ledger.add_active("b-1").await.unwrap();

        assert_eq!(
            ledger.list_active().await.unwrap(),
            vec!["b-1".to_string(), "b-2".to_string()]
        );
    }

    #[tokio::test]
    async fn remove_absent_id_is_noop() {
        let ledger = ledger();
        ledger.add_active("b-1").await.unwrap();
        ledger.remove_active("b-9").await.unwrap();

        assert_eq!(ledger.list_active().await.unwrap(), vec!["b-1".to_string()]);
    }

    #[tokio::test]
    async fn retire_removes_record_and_index() {
        let ledger = ledger();
        register_batch(&ledger, &batch("b-1", Uuid::new_v4()))
            .await
            .unwrap();

        retire_batch(&ledger, "b-1").await.unwrap();

        assert!(ledger.load("b-1").await.unwrap().is_none());
        assert!(ledger.list_active().await.unwrap().is_empty());
        assert!(ledger.store().is_empty());
    }

    #[tokio::test]
    async fn find_for_tenant_skips_orphans_and_other_tenants() {
        let ledger = ledger();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();

        ledger.add_active("orphan").await.unwrap();
        register_batch(&ledger, &batch("b-a", tenant_a)).await.unwrap();
        register_batch(&ledger, &batch("b-b", tenant_b)).await.unwrap();

        let found = find_active_batch_for_tenant(&ledger, tenant_b)
            .await
            .unwrap()
            .expect("tenant b has a batch");
        assert_eq!(found.batch_id, "b-b");

        let none = find_active_batch_for_tenant(&ledger, Uuid::new_v4())
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn expired_record_leaves_orphan_index_entry() {
        let ledger = KvBatchLedger::new(
            Arc::new(MemoryStore::new()),
            Some(Duration::from_millis(20)),
        );
        register_batch(&ledger, &batch("b-1", Uuid::new_v4()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(ledger.load("b-1").await.unwrap().is_none());
        assert_eq!(ledger.list_active().await.unwrap(), vec!["b-1".to_string()]);
    }

    #[tokio::test]
    async fn find_for_tenant_skips_undecodable_records() {
        let ledger = ledger();
        let tenant = Uuid::new_v4();

        ledger.add_active("garbled").await.unwrap();
        ledger
            .store()
            .set(&batch_key("garbled"), r#"{"batchID":"garbled"}"#, None)
            .await
            .unwrap();
        register_batch(&ledger, &batch("b-ok", tenant)).await.unwrap();

        let found = find_active_batch_for_tenant(&ledger, tenant)
            .await
            .unwrap()
            .expect("healthy record is still found");
        assert_eq!(found.batch_id, "b-ok");
    }

    #[tokio::test]
    async fn corrupt_index_is_a_serialize_error() {
        let ledger = ledger();
        ledger
            .store()
            .set(ACTIVE_INDEX_KEY, "not json", None)
            .await
            .unwrap();

        let err = ledger.list_active().await.unwrap_err();
        assert!(matches!(err, LedgerError::Serialize(_)));
    }
}
