//! Wire types for the external transcription service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coursehub_db::LessonRow;

/// Body of `POST /api/v2/extract-and-embed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitBatchRequest {
    #[serde(alias = "tenantID", alias = "tenantId")]
    pub tenant_id: Uuid,
    pub lessons: Vec<LessonRef>,
}

impl SubmitBatchRequest {
    #[must_use]
    pub fn new(tenant_id: Uuid, lessons: &[LessonRow]) -> Self {
        Self {
            tenant_id,
            lessons: lessons.iter().map(LessonRef::from).collect(),
        }
    }

    /// Lesson ids in submission order.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<Uuid> {
        self.lessons.iter().map(|l| l.lesson_id).collect()
    }
}

/// One lesson's identifier and content reference inside a batch request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonRef {
    #[serde(alias = "lessonID", alias = "lessonId")]
    pub lesson_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
}

impl From<&LessonRow> for LessonRef {
    fn from(row: &LessonRow) -> Self {
        Self {
            lesson_id: row.id,
            title: row.title.clone(),
            video_url: row.video_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitBatchResponse {
    #[serde(alias = "batchID", alias = "batchId")]
    pub batch_id: String,
}

/// Body of `GET /api/jobs/{batch_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    #[serde(default, alias = "batchID", alias = "batchId")]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonStatusItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonStatusItem {
    #[serde(alias = "lessonID", alias = "lessonId")]
    pub lesson_id: Uuid,
    pub status: LessonStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-lesson status reported by the service.
///
/// Anything other than `COMPLETED` or `FAILED` (`PENDING`, `PROCESSING`, ...)
/// is still in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "String")]
pub enum LessonStatus {
    Pending,
    Completed,
    Failed,
}

impl LessonStatus {
    /// `true` once the status can no longer change on further polling.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LessonStatus::Completed | LessonStatus::Failed)
    }
}

impl From<String> for LessonStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMPLETED" => LessonStatus::Completed,
            "FAILED" => LessonStatus::Failed,
            _ => LessonStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_statuses_are_pending() {
        for raw in ["PENDING", "PROCESSING", "queued", ""] {
            assert_eq!(LessonStatus::from(raw.to_string()), LessonStatus::Pending);
        }
    }

    #[test]
    fn terminal_statuses_parse_case_insensitively() {
        assert_eq!(
            LessonStatus::from("completed".to_string()),
            LessonStatus::Completed
        );
        assert_eq!(LessonStatus::from("FAILED".to_string()), LessonStatus::Failed);
        assert!(LessonStatus::Completed.is_terminal());
        assert!(LessonStatus::Failed.is_terminal());
        assert!(!LessonStatus::Pending.is_terminal());
    }

    #[test]
    fn status_response_accepts_camel_case_ids() {
        let lesson_id = Uuid::new_v4();
        let body = serde_json::json!({
            "batchID": "b-1",
            "lessons": [
                { "lessonID": lesson_id, "status": "FAILED", "error": "no audio track" }
            ]
        });

        let parsed: BatchStatusResponse = serde_json::from_value(body).expect("parse");
        assert_eq!(parsed.batch_id.as_deref(), Some("b-1"));
        assert_eq!(parsed.lessons[0].lesson_id, lesson_id);
        assert_eq!(parsed.lessons[0].status, LessonStatus::Failed);
        assert_eq!(parsed.lessons[0].error.as_deref(), Some("no audio track"));
    }

    #[test]
    fn submit_request_serializes_snake_case() {
        let tenant_id = Uuid::new_v4();
        let request = SubmitBatchRequest {
            tenant_id,
            lessons: vec![LessonRef {
                lesson_id: Uuid::new_v4(),
                title: "Lamination".to_string(),
                video_url: None,
            }],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["tenant_id"], serde_json::json!(tenant_id));
        assert_eq!(json["lessons"][0]["title"], "Lamination");
    }
}
