/// Project model
///
/// A project is the container every task, comment, activity entry, membership and
/// invitation hangs off. Its owner is the identity that created it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT NOT NULL,
///     description TEXT,
///     goals TEXT,
///     deadline DATE NOT NULL,
///     status TEXT NOT NULL DEFAULT 'todo',
///     created_by UUID NOT NULL REFERENCES auth.users(id),
///     owner_id UUID NOT NULL REFERENCES auth.users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::WorkStatus;
use super::validation::validate_not_blank;

/// Project row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-text objectives
    #[serde(default)]
    pub goals: Option<String>,

    pub deadline: NaiveDate,

    pub status: WorkStatus,

    pub created_by: Uuid,

    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether the given user owns this project
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Case-insensitive match on title or description
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

/// Insert payload for the `projects` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub goals: Option<String>,
    pub deadline: NaiveDate,
    pub status: WorkStatus,
    pub created_by: Uuid,
    pub owner_id: Uuid,
}

/// "New project" form input
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectForm {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank", message = "Title is required")
    )]
    pub title: String,

    #[validate(custom(function = "validate_not_blank", message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub goals: Option<String>,

    pub deadline: NaiveDate,
}

/// Project list filters (search box + status buttons)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFilter {
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub status: Option<WorkStatus>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => project.matches_search(term),
            _ => true,
        };
        let status_ok = self.status.map(|s| project.status == s).unwrap_or(true);
        search_ok && status_ok
    }
}
