/// Comment model
///
/// A comment hangs off either a project or a task. Task comments also carry the id of
/// the task's project so that project-scoped queries (unread counts, change-feed
/// filters) see them. Comments are immutable once written.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID REFERENCES projects(id) ON DELETE CASCADE,
///     task_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_by UUID NOT NULL REFERENCES auth.users(id),
///     created_by_name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (project_id IS NOT NULL OR task_id IS NOT NULL)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::validate_not_blank;

/// Where a comment is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CommentTarget {
    Project(Uuid),
    Task(Uuid),
}

/// Comment row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,

    #[serde(default)]
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub task_id: Option<Uuid>,

    pub content: String,

    pub created_by: Uuid,

    pub created_by_name: String,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Attachment point; the task wins when both columns are set
    pub fn target(&self) -> Option<CommentTarget> {
        match (self.task_id, self.project_id) {
            (Some(task_id), _) => Some(CommentTarget::Task(task_id)),
            (None, Some(project_id)) => Some(CommentTarget::Project(project_id)),
            (None, None) => None,
        }
    }

    /// Project-level comment (not attached to a task)
    pub fn is_project_level(&self) -> bool {
        matches!(self.target(), Some(CommentTarget::Project(_)))
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}

/// Insert payload for the `comments` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub project_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    pub content: String,
    pub created_by: Uuid,
    pub created_by_name: String,
}

impl NewComment {
    /// Payload for a comment on a project or on one of its tasks
    pub fn for_target(
        target: CommentTarget,
        project_id: Uuid,
        content: String,
        created_by: Uuid,
        created_by_name: String,
    ) -> Self {
        let task_id = match target {
            CommentTarget::Task(task_id) => Some(task_id),
            CommentTarget::Project(_) => None,
        };
        Self {
            project_id: Some(project_id),
            task_id,
            content,
            created_by,
            created_by_name,
        }
    }
}

/// Comment box input
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(custom(function = "validate_not_blank", message = "Comment cannot be empty"))]
    pub content: String,
}

/// Which comments a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    /// Everything visible to the caller
    All,

    /// Every comment carrying this project id, task comments included
    Project(Uuid),

    /// Project-level comments only
    ProjectLevel(Uuid),

    /// Comments on one task
    Task(Uuid),
}

impl CommentScope {
    /// Scope for an optional project filter
    pub fn for_project(project_id: Option<Uuid>) -> Self {
        project_id.map(CommentScope::Project).unwrap_or(CommentScope::All)
    }

    pub fn includes(&self, comment: &Comment) -> bool {
        match self {
            CommentScope::All => true,
            CommentScope::Project(id) => comment.project_id == Some(*id),
            CommentScope::ProjectLevel(id) => {
                comment.project_id == Some(*id) && comment.task_id.is_none()
            }
            CommentScope::Task(id) => comment.task_id == Some(*id),
        }
    }
}

/// Comment list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentQuery {
    pub scope: CommentScope,

    /// Skip comments written by this user
    pub exclude_author: Option<Uuid>,

    /// Oldest first when true
    pub ascending: bool,
}

impl CommentQuery {
    pub fn new(scope: CommentScope) -> Self {
        Self {
            scope,
            exclude_author: None,
            ascending: false,
        }
    }

    pub fn excluding_author(mut self, user_id: Uuid) -> Self {
        self.exclude_author = Some(user_id);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.ascending = true;
        self
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.scope.includes(comment)
            && self
                .exclude_author
                .map(|author| comment.created_by != author)
                .unwrap_or(true)
    }
}
