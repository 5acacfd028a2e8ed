use thiserror::Error;

/// Errors raised by the cache-backed job ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("ledger serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors returned by the transcription client and jobs.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// No transcription service base URL is configured.
    #[error("transcription service URL is not configured")]
    NotConfigured,

    #[error("invalid transcription service URL: {0}")]
    InvalidBaseUrl(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("transcription service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The service no longer knows the batch (404 on the status endpoint).
    #[error("transcription batch {0} not found")]
    BatchNotFound(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] coursehub_db::DbError),
}
