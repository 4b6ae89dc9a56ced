/// Activity log model
///
/// Append-only audit trail of user actions inside a project. The application writes an
/// entry after every successful mutation and only ever reads the table for display.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES auth.users(id),
///     user_name TEXT NOT NULL,
///     action TEXT NOT NULL,
///     details TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Action tag stored in `activity_logs.action`
///
/// The column is free-form text, so unknown tags are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityAction {
    ProjectCreated,
    StatusUpdated,
    TaskCreated,
    TaskStatusUpdated,
    CommentAdded,
    ProjectCommentAdded,
    MemberInvited,
    InvitationCancelled,
    InvitationAccepted,
    Other(String),
}

/// Rendering group for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Project,
    Task,
    Status,
    Comment,
    Membership,
    Other,
}

impl ActivityAction {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityAction::ProjectCreated => "project_created",
            ActivityAction::StatusUpdated => "status_updated",
            ActivityAction::TaskCreated => "task_created",
            ActivityAction::TaskStatusUpdated => "task_status_updated",
            ActivityAction::CommentAdded => "comment_added",
            ActivityAction::ProjectCommentAdded => "project_comment_added",
            ActivityAction::MemberInvited => "member_invited",
            ActivityAction::InvitationCancelled => "invitation_cancelled",
            ActivityAction::InvitationAccepted => "invitation_accepted",
            ActivityAction::Other(tag) => tag,
        }
    }

    /// Badge text
    pub fn label(&self) -> String {
        match self {
            ActivityAction::ProjectCreated => "Project Created".to_string(),
            ActivityAction::StatusUpdated => "Status Updated".to_string(),
            ActivityAction::TaskCreated => "Task Created".to_string(),
            ActivityAction::TaskStatusUpdated => "Task Status Updated".to_string(),
            ActivityAction::CommentAdded => "Comment Added".to_string(),
            ActivityAction::ProjectCommentAdded => "Project Comment Added".to_string(),
            ActivityAction::MemberInvited => "Member Invited".to_string(),
            ActivityAction::InvitationCancelled => "Invitation Cancelled".to_string(),
            ActivityAction::InvitationAccepted => "Invitation Accepted".to_string(),
            ActivityAction::Other(tag) => title_case(tag),
        }
    }

    pub fn category(&self) -> ActivityCategory {
        match self {
            ActivityAction::ProjectCreated => ActivityCategory::Project,
            ActivityAction::TaskCreated => ActivityCategory::Task,
            ActivityAction::StatusUpdated | ActivityAction::TaskStatusUpdated => {
                ActivityCategory::Status
            }
            ActivityAction::CommentAdded | ActivityAction::ProjectCommentAdded => {
                ActivityCategory::Comment
            }
            ActivityAction::MemberInvited
            | ActivityAction::InvitationCancelled
            | ActivityAction::InvitationAccepted => ActivityCategory::Membership,
            ActivityAction::Other(_) => ActivityCategory::Other,
        }
    }
}

fn title_case(tag: &str) -> String {
    tag.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<String> for ActivityAction {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "project_created" => ActivityAction::ProjectCreated,
            "status_updated" => ActivityAction::StatusUpdated,
            "task_created" => ActivityAction::TaskCreated,
            "task_status_updated" => ActivityAction::TaskStatusUpdated,
            "comment_added" => ActivityAction::CommentAdded,
            "project_comment_added" => ActivityAction::ProjectCommentAdded,
            "member_invited" => ActivityAction::MemberInvited,
            "invitation_cancelled" => ActivityAction::InvitationCancelled,
            "invitation_accepted" => ActivityAction::InvitationAccepted,
            _ => ActivityAction::Other(tag),
        }
    }
}

impl From<ActivityAction> for String {
    fn from(action: ActivityAction) -> Self {
        match action {
            ActivityAction::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub action: ActivityAction,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Case-insensitive match on actor name or details
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.user_name.to_lowercase().contains(&needle)
            || self.details.to_lowercase().contains(&needle)
    }
}

/// Insert payload for the `activity_logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivityLog {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub action: ActivityAction,
    pub details: String,
}

/// Activity page filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub search: Option<String>,

    #[serde(default)]
    pub project_id: Option<Uuid>,
}

impl ActivityFilter {
    pub fn matches(&self, log: &ActivityLog) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => log.matches_search(term),
            _ => true,
        };
        let project_ok = self.project_id.map(|id| log.project_id == id).unwrap_or(true);
        search_ok && project_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_actions_round_trip_as_tags() {
        let action: ActivityAction = serde_json::from_str("\"task_status_updated\"").unwrap();
        assert_eq!(action, ActivityAction::TaskStatusUpdated);
        assert_eq!(
            serde_json::to_string(&ActivityAction::MemberInvited).unwrap(),
            "\"member_invited\""
        );
    }

    #[test]
    fn test_unknown_action_is_preserved() {
        let action: ActivityAction = serde_json::from_str("\"file_uploaded\"").unwrap();
        assert_eq!(action, ActivityAction::Other("file_uploaded".to_string()));
        assert_eq!(action.label(), "File Uploaded");
        assert_eq!(action.category(), ActivityCategory::Other);
        assert_eq!(serde_json::to_string(&action).unwrap(), "\"file_uploaded\"");
    }

    #[test]
    fn test_categories() {
        assert_eq!(ActivityAction::ProjectCreated.category(), ActivityCategory::Project);
        assert_eq!(ActivityAction::StatusUpdated.category(), ActivityCategory::Status);
        assert_eq!(ActivityAction::TaskStatusUpdated.category(), ActivityCategory::Status);
        assert_eq!(ActivityAction::ProjectCommentAdded.category(), ActivityCategory::Comment);
        assert_eq!(ActivityAction::InvitationCancelled.category(), ActivityCategory::Membership);
    }

    #[test]
    fn test_filter() {
        let project = Uuid::new_v4();
        let log = ActivityLog {
            id: Uuid::new_v4(),
            project_id: project,
            user_id: Uuid::new_v4(),
            user_name: "Grace Hopper".to_string(),
            action: ActivityAction::TaskCreated,
            details: "Created task: Compile report".to_string(),
            created_at: Utc::now(),
        };

        assert!(ActivityFilter::default().matches(&log));
        assert!(ActivityFilter {
            search: Some("grace".to_string()),
            project_id: Some(project)
        }
        .matches(&log));
        assert!(ActivityFilter {
            search: Some("REPORT".to_string()),
            project_id: None
        }
        .matches(&log));
        assert!(!ActivityFilter {
            search: None,
            project_id: Some(Uuid::new_v4())
        }
        .matches(&log));
    }
}
