//! The two recurring transcription jobs.
//!
//! [`SubmissionJob`] runs daily and submits each AI-enabled tenant's
//! untranscribed lessons as one batch. [`StatusCheckerJob`] runs every few
//! minutes, polls outstanding batches, marks finished lessons, and prunes
//! batches whose lessons have all reached a terminal status. The jobs share
//! nothing but the ledger.

mod status;
mod submission;

pub use status::{StatusCheckerJob, StatusSummary};
pub use submission::{SubmissionJob, SubmissionSummary};
