//! Project writes. Routed behind [`super::auth::admin_auth_middleware`], so
//! nothing here runs for an unauthenticated caller.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ServiceConfig;
use crate::error::{ApiError, ProjectError};
use crate::http::AppState;
use crate::models::Project;
use crate::observability::metrics;
use crate::projects::sanitize_project_fields;
use crate::security::{Clock, SystemClock};
use crate::services::{FieldEq, UpstreamError};
use crate::validation::validate_project;

/// Attributes a caller may never overwrite.
const IMMUTABLE_FIELDS: [&str; 2] = ["id", "createdAt"];

#[derive(Serialize)]
pub struct ProjectWritten {
    pub success: bool,
    pub project: Project,
}

#[derive(Serialize)]
pub struct ProjectDeleted {
    pub success: bool,
    pub id: String,
}

fn parse_document(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

/// Sanitize, validate and type a project document. Validation sees the
/// stored text, so markup can't pad a field past its checks.
fn finalize(mut document: Value, config: &ServiceConfig) -> Result<Project, ApiError> {
    if let Some(fields) = document.as_object_mut() {
        // Explicit nulls fall back to the field defaults.
        fields.retain(|_, value| !value.is_null());
        sanitize_project_fields(fields);
    }
    let errors = validate_project(&document, &config.security.trusted_image_prefix);
    if !errors.is_empty() {
        return Err(ApiError::InvalidFields(errors));
    }
    serde_json::from_value(document).map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

fn to_item(project: &Project) -> Result<Value, ApiError> {
    serde_json::to_value(project).map_err(|e| UpstreamError::Decode(e.to_string()).into())
}

pub async fn create_project(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let config = state.config();

    let response = match create(&state, &config, &body).await {
        Ok(project) => (
            StatusCode::CREATED,
            Json(ProjectWritten {
                success: true,
                project,
            }),
        )
            .into_response(),
        Err(e) => ProjectError::new(e, "Failed to create project", config.security.dev_mode).into_response(),
    };

    metrics::record_request("project_create", response.status().as_u16(), start);
    response
}

async fn create(state: &AppState, config: &ServiceConfig, body: &Bytes) -> Result<Project, ApiError> {
    let mut project = finalize(parse_document(body)?, config)?;

    let now = SystemClock.now_ms();
    project.id = uuid::Uuid::new_v4().to_string();
    project.created_at = Some(now);
    project.updated_at = Some(now);

    state
        .services
        .records
        .put(&config.storage.projects_table, to_item(&project)?)
        .await?;

    tracing::info!(project_id = %project.id, title = %project.title, "Project created");
    Ok(project)
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let config = state.config();

    let response = match update(&state, &config, &id, &body).await {
        Ok(project) => Json(ProjectWritten {
            success: true,
            project,
        })
        .into_response(),
        Err(e) => ProjectError::new(e, "Failed to update project", config.security.dev_mode).into_response(),
    };

    metrics::record_request("project_update", response.status().as_u16(), start);
    response
}

async fn update(
    state: &AppState,
    config: &ServiceConfig,
    id: &str,
    body: &Bytes,
) -> Result<Project, ApiError> {
    let table = &config.storage.projects_table;
    let changes = match parse_document(body)? {
        Value::Object(changes) => changes,
        _ => return Err(ApiError::Validation("Request body must be a JSON object".to_string())),
    };

    let existing = state
        .services
        .records
        .get(table, &FieldEq::new("id", id))
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    let mut merged = match existing {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    for (field, value) in changes {
        if !IMMUTABLE_FIELDS.contains(&field.as_str()) {
            merged.insert(field, value);
        }
    }

    let mut project = finalize(Value::Object(merged), config)?;
    project.id = id.to_string();
    project.updated_at = Some(SystemClock.now_ms());

    state.services.records.put(table, to_item(&project)?).await?;

    tracing::info!(project_id = %id, "Project updated");
    Ok(project)
}

pub async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let start = Instant::now();
    let config = state.config();

    let response = match delete(&state, &config, &id).await {
        Ok(()) => Json(ProjectDeleted { success: true, id }).into_response(),
        Err(e) => ProjectError::new(e, "Failed to delete project", config.security.dev_mode).into_response(),
    };

    metrics::record_request("project_delete", response.status().as_u16(), start);
    response
}

async fn delete(state: &AppState, config: &ServiceConfig, id: &str) -> Result<(), ApiError> {
    let table = &config.storage.projects_table;
    let key = FieldEq::new("id", id);

    if state.services.records.get(table, &key).await?.is_none() {
        return Err(ApiError::NotFound("Project"));
    }
    state.services.records.delete(table, &key).await?;

    tracing::info!(project_id = %id, "Project deleted");
    Ok(())
}
