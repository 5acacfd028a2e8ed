//! AI transcription pipeline for course lessons.
//!
//! Submits untranscribed lessons to the external transcription service in
//! per-tenant batches, tracks outstanding batches in a cache-backed ledger,
//! and reconciles lesson completion as the service reports progress.

pub mod client;
pub mod error;
pub mod jobs;
pub mod ledger;
pub mod store;
pub mod types;

pub use client::TranscriptionClient;
pub use error::{LedgerError, TranscriptionError};
pub use jobs::{StatusCheckerJob, StatusSummary, SubmissionJob, SubmissionSummary};
pub use ledger::{
    BatchLedger, KeyValueStore, KvBatchLedger, MemoryStore, RedisStore, TranscriptionBatch,
};
pub use store::CourseStore;
pub use types::{
    BatchStatusResponse, LessonRef, LessonStatus, LessonStatusItem, SubmitBatchRequest,
};
