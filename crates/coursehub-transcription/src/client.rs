//! HTTP client for the external transcription service.
//!
//! Two endpoints are used: batch submission and per-batch status. Non-2xx
//! answers surface as [`TranscriptionError::Api`] with the status code and
//! response body so callers can log them verbatim. The client never retries;
//! the daily and ten-minute schedules are the retry policy.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::TranscriptionError;
use crate::types::{BatchStatusResponse, SubmitBatchRequest, SubmitBatchResponse};

const SUBMIT_PATH: [&str; 3] = ["api", "v2", "extract-and-embed"];

/// Client for the transcription service.
///
/// Built with an optional base URL: an unconfigured client reports
/// `is_configured() == false` and fails every call with
/// [`TranscriptionError::NotConfigured`] without touching the network.
#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    client: Client,
    base_url: Option<Url>,
}

impl TranscriptionClient {
    /// Creates a client for `base_url`, or an unconfigured client when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TranscriptionError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: Option<&str>, timeout_secs: u64) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("coursehub/0.1 (transcription)")
            .build()?;

        let base_url = base_url.map(parse_base_url).transpose()?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Submits one batch of lessons and returns the service's batch id.
    ///
    /// # Errors
    ///
    /// - [`TranscriptionError::NotConfigured`] if no base URL is set.
    /// - [`TranscriptionError::Http`] on network failure.
    /// - [`TranscriptionError::Api`] on a non-2xx status or an empty batch id.
    /// - [`TranscriptionError::Deserialize`] if the body is not the expected JSON.
    pub async fn submit_batch(
        &self,
        request: &SubmitBatchRequest,
    ) -> Result<String, TranscriptionError> {
        let url = self.endpoint(&SUBMIT_PATH)?;
        let response = self.client.post(url.clone()).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SubmitBatchResponse =
            serde_json::from_str(&body).map_err(|e| TranscriptionError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if parsed.batch_id.trim().is_empty() {
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parsed.batch_id)
    }

    /// Fetches the per-lesson status of a batch.
    ///
    /// # Errors
    ///
    /// - [`TranscriptionError::NotConfigured`] if no base URL is set.
    /// - [`TranscriptionError::BatchNotFound`] on a 404.
    /// - [`TranscriptionError::Http`] on network failure.
    /// - [`TranscriptionError::Api`] on any other non-2xx status.
    /// - [`TranscriptionError::Deserialize`] if the body is not the expected JSON.
    pub async fn batch_status(
        &self,
        batch_id: &str,
    ) -> Result<BatchStatusResponse, TranscriptionError> {
        let url = self.endpoint(&["api", "jobs", batch_id, "status"])?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TranscriptionError::BatchNotFound(batch_id.to_string()));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TranscriptionError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TranscriptionError> {
        let mut url = self
            .base_url
            .clone()
            .ok_or(TranscriptionError::NotConfigured)?;
        url.path_segments_mut()
            .map_err(|()| TranscriptionError::InvalidBaseUrl("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TranscriptionError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| TranscriptionError::InvalidBaseUrl(format!("'{raw}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(TranscriptionError::InvalidBaseUrl(format!(
            "'{raw}': expected an absolute http(s) URL"
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> TranscriptionClient {
        TranscriptionClient::new(Some(base_url), 30).expect("client construction should not fail")
    }

    #[test]
    fn submit_endpoint_is_appended_to_base() {
        let client = test_client("https://ai.example.com");
        let url = client.endpoint(&SUBMIT_PATH).unwrap();
        assert_eq!(url.as_str(), "https://ai.example.com/api/v2/extract-and-embed");
    }

    #[test]
    fn base_path_and_trailing_slash_are_preserved() {
        let client = test_client("https://ai.example.com/transcriber/");
        let url = client.endpoint(&["api", "jobs", "b-1", "status"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ai.example.com/transcriber/api/jobs/b-1/status"
        );
    }

    #[test]
    fn batch_id_is_encoded_as_one_segment() {
        let client = test_client("https://ai.example.com");
        let url = client.endpoint(&["api", "jobs", "a/b c", "status"]).unwrap();
        assert_eq!(url.as_str(), "https://ai.example.com/api/jobs/a%2Fb%20c/status");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = TranscriptionClient::new(Some("mailto:ops@example.com"), 30).unwrap_err();
        assert!(matches!(err, TranscriptionError::InvalidBaseUrl(_)));
    }

    #[test]
    fn unconfigured_client_reports_not_configured() {
        let client = TranscriptionClient::new(None, 30).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.endpoint(&SUBMIT_PATH),
            Err(TranscriptionError::NotConfigured)
        ));
    }
}
