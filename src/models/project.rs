//! Portfolio projects.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Published,
    Draft,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Published => "published",
            ProjectStatus::Draft => "draft",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(ProjectStatus::Published),
            "draft" => Ok(ProjectStatus::Draft),
            "archived" => Ok(ProjectStatus::Archived),
            other => Err(format!("unknown project status '{other}'")),
        }
    }
}

/// A portfolio project as stored in the projects table.
///
/// Attributes this service doesn't know about are kept in `extra` so that
/// reads and admin updates don't drop data written by other tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub order: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sort ascending by display order. Ties keep their input order.
pub fn sort_by_order(projects: &mut [Project]) {
    projects.sort_by(|a, b| a.order.total_cmp(&b.order));
}

/// Body returned by `GET /api/projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    pub success: bool,
    pub count: usize,
    pub category: String,
    pub projects: Vec<Project>,
}
