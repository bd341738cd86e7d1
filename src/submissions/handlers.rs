//! `POST /api/submit` and `GET /api/submissions`.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Request, State},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::{EmailFailurePolicy, ServiceConfig};
use crate::error::{ApiError, ListingError, SubmissionError};
use crate::http::request::{client_id, idempotency_key};
use crate::http::AppState;
use crate::models::{ResumeRef, Submission, SubmissionList, SubmitRequest, SubmitResponse};
use crate::observability::metrics;
use crate::security::{Clock, SystemClock};
use crate::services::{content_type_for, resume_key, Collaborators, UpstreamError};
use crate::validation::{missing_required_fields, validate_email};

use super::notifications::{operator_notification, submitter_confirmation};

const ACCEPTED_MESSAGE: &str = "Submission received successfully";

fn accepted(submission_id: String) -> Json<SubmitResponse> {
    Json(SubmitResponse {
        message: ACCEPTED_MESSAGE.to_string(),
        submission_id,
    })
}

pub async fn submit(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let client = client_id(
        &parts.headers,
        &parts.extensions,
        &state.config().security.trusted_proxies,
    );
    let key = idempotency_key(&parts.headers);

    let response = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => match process_submission(&state, &client, key, bytes).await {
            Ok(accepted) => accepted.into_response(),
            Err(e) => e.into_response(),
        },
        Err(e) => SubmissionError(ApiError::MalformedPayload(e.to_string())).into_response(),
    };

    metrics::record_request("submit", response.status().as_u16(), start);
    response
}

async fn process_submission(
    state: &AppState,
    client: &str,
    key: Option<String>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, SubmissionError> {
    let config = state.config();

    if let Some(key) = key.as_deref() {
        if let Some(existing) = state.idempotency.lookup(client, key, SystemClock.now_ms()) {
            tracing::info!(client = %client, submission_id = %existing, "Replayed idempotent submission");
            return Ok(accepted(existing));
        }
    }

    if config.rate_limit.enabled && !state.limiter.allow(client) {
        return Err(ApiError::RateLimited.into());
    }

    let request: SubmitRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedPayload(e.to_string()))?;

    let missing = missing_required_fields(&request);
    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        ))
        .into());
    }

    let email = request.email.as_deref().unwrap_or_default();
    if !validate_email(email) {
        return Err(ApiError::Validation("Invalid email address".to_string()).into());
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = SystemClock.now_ms();

    let resume = match (request.resume_file.as_deref(), request.resume_file_name.as_deref()) {
        (Some(file), Some(name)) if !file.is_empty() && !name.is_empty() => {
            upload_resume(&state.services, &config, &id, now, file, name).await
        }
        _ => None,
    };
    let with_resume = resume.is_some();

    let mut submission = Submission::from_request(id.clone(), request, client.to_string(), now, resume);
    submission.idempotency_key = key.clone();

    let item = serde_json::to_value(&submission).map_err(|e| UpstreamError::Decode(e.to_string()))?;
    state
        .services
        .records
        .put(&config.storage.submissions_table, item)
        .await?;

    if let Some(key) = key.as_deref() {
        state.idempotency.remember(client, key, &id, now);
    }
    metrics::record_submission(with_resume);
    tracing::info!(submission_id = %id, client = %client, with_resume, "Submission stored");

    send_notifications(&state.services, &config, &submission).await?;

    Ok(accepted(id))
}

/// Decode and store the resume. Any failure is logged and the submission
/// carries on without one.
async fn upload_resume(
    services: &Collaborators,
    config: &ServiceConfig,
    submission_id: &str,
    now_ms: u64,
    file: &str,
    file_name: &str,
) -> Option<ResumeRef> {
    let bytes = match decode_inline_file(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(submission_id = %submission_id, error = %e, "Resume is not valid base64");
            metrics::record_resume_upload_failure();
            return None;
        }
    };

    let key = resume_key(submission_id, now_ms, file_name);
    let metadata = HashMap::from([
        ("submissionId".to_string(), submission_id.to_string()),
        ("originalName".to_string(), file_name.to_string()),
    ]);

    match services
        .objects
        .put(
            &config.storage.resume_bucket,
            &key,
            bytes,
            content_type_for(file_name),
            metadata,
        )
        .await
    {
        Ok(url) => Some(ResumeRef {
            url,
            file_name: file_name.to_string(),
        }),
        Err(e) => {
            tracing::warn!(submission_id = %submission_id, error = %e, "Resume upload failed");
            metrics::record_resume_upload_failure();
            None
        }
    }
}

/// Base64 payload, with or without a `data:<type>;base64,` prefix.
pub fn decode_inline_file(file: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match file.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
        None => file,
    };
    STANDARD.decode(payload.trim())
}

async fn send_notifications(
    services: &Collaborators,
    config: &ServiceConfig,
    submission: &Submission,
) -> Result<(), UpstreamError> {
    let mails = [
        operator_notification(&config.email, submission),
        submitter_confirmation(&config.email, submission),
    ];

    for mail in &mails {
        if let Err(e) = services.email.send(mail).await {
            match config.email.failure_policy {
                EmailFailurePolicy::Abort => return Err(e),
                EmailFailurePolicy::Log => {
                    metrics::record_upstream_error(e.collaborator());
                    tracing::warn!(
                        submission_id = %submission.id,
                        error = %e,
                        "Notification failed, submission kept"
                    );
                }
            }
        }
    }
    Ok(())
}

pub async fn list_submissions(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let config = state.config();

    let response = match fetch_submissions(&state.services, &config).await {
        Ok(list) => Json(list).into_response(),
        Err(error) => ListingError {
            error,
            dev_mode: config.security.dev_mode,
        }
        .into_response(),
    };

    metrics::record_request("submissions", response.status().as_u16(), start);
    response
}

async fn fetch_submissions(
    services: &Collaborators,
    config: &ServiceConfig,
) -> Result<SubmissionList, ApiError> {
    let items = services
        .records
        .scan(&config.storage.submissions_table, None)
        .await?;

    let mut submissions: Vec<Submission> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(submission) => Some(submission),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable submission record");
                None
            }
        })
        .collect();
    submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(SubmissionList {
        count: submissions.len(),
        submissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        assert_eq!(decode_inline_file("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_inline_file("data:application/pdf;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
        assert!(decode_inline_file("not base64!").is_err());
    }
}
