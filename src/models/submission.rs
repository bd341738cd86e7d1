//! Contact submission records and the public request schema.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE: &str = "General Inquiry";

/// Body accepted by `POST /api/submit`.
///
/// Every field is optional at the type level so the handler can report all
/// missing required fields at once instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service: Option<String>,
    pub timeline: Option<String>,
    /// Base64 file content, optionally as a `data:` URL.
    pub resume_file: Option<String>,
    pub resume_file_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}

/// A stored contact submission. Written once; `status` is only changed by
/// external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default)]
    pub timeline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_file_name: Option<String>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub ip_address: String,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

/// An uploaded resume attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRef {
    pub url: String,
    pub file_name: String,
}

impl Submission {
    /// Build the record for an accepted request. Required fields must already
    /// have been checked.
    pub fn from_request(
        id: String,
        request: SubmitRequest,
        ip_address: String,
        created_at: u64,
        resume: Option<ResumeRef>,
    ) -> Self {
        let optional = |v: Option<String>| v.unwrap_or_default();
        let service = request
            .service
            .filter(|s| !s.is_empty())
            .unwrap_or_else(default_service);
        let (resume_url, resume_file_name) = match resume {
            Some(r) => (Some(r.url), Some(r.file_name)),
            None => (None, None),
        };

        Self {
            id,
            name: optional(request.name),
            email: optional(request.email),
            message: optional(request.message),
            phone: optional(request.phone),
            company: optional(request.company),
            service,
            timeline: optional(request.timeline),
            resume_url,
            resume_file_name,
            status: SubmissionStatus::New,
            ip_address,
            created_at,
            updated_at: created_at,
            idempotency_key: None,
        }
    }
}

/// Body returned by a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: String,
    pub submission_id: String,
}

/// Body returned by `GET /api/submissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionList {
    pub submissions: Vec<Submission>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_on_creation() {
        let request: SubmitRequest = serde_json::from_value(serde_json::json!({
            "name": " Ada ",
            "email": "ada@example.com",
            "message": "Hi",
            "service": ""
        }))
        .unwrap();

        let submission = Submission::from_request("id-1".into(), request, "10.0.0.1".into(), 42, None);
        assert_eq!(submission.name, " Ada ");
        assert_eq!(submission.service, DEFAULT_SERVICE);
        assert_eq!(submission.phone, "");
        assert_eq!(submission.status, SubmissionStatus::New);
        assert_eq!(submission.updated_at, submission.created_at);
        assert!(submission.resume_url.is_none());
    }

    #[test]
    fn serializes_camel_case_without_empty_resume() {
        let submission = Submission::from_request(
            "id-2".into(),
            SubmitRequest {
                name: Some("Ada".into()),
                email: Some("ada@example.com".into()),
                message: Some("Hi".into()),
                ..Default::default()
            },
            "unknown".into(),
            7,
            None,
        );
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["ipAddress"], "unknown");
        assert_eq!(value["createdAt"], 7);
        assert_eq!(value["status"], "new");
        assert!(value.get("resumeUrl").is_none());
    }
}
