//! Public portfolio listing.
//!
//! Reads go straight to the record store on every request; freshness is left
//! to the `Cache-Control` header in front of the CDN.

use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ServiceConfig;
use crate::error::{ApiError, ProjectError};
use crate::http::response::PROJECTS_CACHE_CONTROL;
use crate::http::AppState;
use crate::models::{sort_by_order, Project, ProjectList, ProjectStatus};
use crate::observability::metrics;
use crate::security::{sanitize, sanitize_param};
use crate::services::{Collaborators, FieldEq};

/// Text attributes stripped of markup on admin writes.
const TEXT_FIELDS: [&str; 3] = ["category", "title", "description"];

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub category: Option<String>,
    pub status: Option<String>,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Response {
    let start = Instant::now();
    let config = state.config();

    let category = sanitize_param(query.category.as_deref());
    let status = sanitize_param(query.status.as_deref())
        .unwrap_or_else(|| ProjectStatus::default().as_str().to_string());

    let response = match fetch_projects(&state.services, &config, category.as_deref(), &status).await {
        Ok(projects) => {
            let body = ProjectList {
                success: true,
                count: projects.len(),
                category: category.unwrap_or_else(|| "all".to_string()),
                projects,
            };
            ([(header::CACHE_CONTROL, PROJECTS_CACHE_CONTROL)], Json(body)).into_response()
        }
        Err(e) => ProjectError::new(e, "Failed to fetch projects", config.security.dev_mode).into_response(),
    };

    metrics::record_request("projects", response.status().as_u16(), start);
    response
}

async fn fetch_projects(
    services: &Collaborators,
    config: &ServiceConfig,
    category: Option<&str>,
    status: &str,
) -> Result<Vec<Project>, ApiError> {
    let storage = &config.storage;
    let status_filter = FieldEq::new("status", status);

    let items = match category {
        Some(category) => {
            services
                .records
                .query(
                    &storage.projects_table,
                    &storage.category_index,
                    &FieldEq::new("category", category),
                    Some(&status_filter),
                )
                .await?
        }
        None => {
            services
                .records
                .scan(&storage.projects_table, Some(&status_filter))
                .await?
        }
    };

    let mut projects: Vec<Project> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable project record");
                None
            }
        })
        .collect();
    sort_by_order(&mut projects);

    tracing::debug!(count = projects.len(), category = ?category, status, "Projects fetched");
    Ok(projects)
}

/// Strip markup from the free-text attributes and tags of a project document.
pub fn sanitize_project_fields(document: &mut Map<String, Value>) {
    for field in TEXT_FIELDS {
        if let Some(Value::String(text)) = document.get_mut(field) {
            *text = sanitize(text);
        }
    }
    if let Some(Value::Array(tags)) = document.get_mut("tags") {
        for tag in tags.iter_mut() {
            if let Value::String(text) = tag {
                *text = sanitize(text);
            }
        }
    }
}
