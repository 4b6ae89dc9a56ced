/// Task model
///
/// Tasks belong to a project. Any collaborator may create one or move it between
/// statuses; there is no delete path.
///
/// The deadline column is kept as the raw string the store returned. Parsing happens
/// at read time (see [`parse_deadline`]) so that a malformed value degrades to
/// "no deadline" instead of failing the whole row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     deadline DATE,
///     priority TEXT DEFAULT 'medium',
///     status TEXT NOT NULL DEFAULT 'todo',
///     file_url TEXT,
///     file_name TEXT,
///     created_by UUID NOT NULL REFERENCES auth.users(id),
///     created_by_name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::status::{Priority, WorkStatus};
use super::validation::validate_not_blank;

/// Task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    pub project_id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Raw deadline (`YYYY-MM-DD` or RFC 3339)
    #[serde(default)]
    pub deadline: Option<String>,

    /// Unset is treated as medium
    #[serde(default)]
    pub priority: Option<Priority>,

    pub status: WorkStatus,

    /// Public URL of the attached file
    #[serde(default)]
    pub file_url: Option<String>,

    /// Original name of the attached file
    #[serde(default)]
    pub file_name: Option<String>,

    pub created_by: Uuid,

    pub created_by_name: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Priority with the medium default applied
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// Parsed deadline, `None` when absent or unparsable
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        self.deadline.as_deref().and_then(parse_deadline)
    }

    /// Deadline relative to `today`
    pub fn deadline_status(&self, today: NaiveDate) -> Option<DeadlineStatus> {
        self.deadline_at()
            .map(|at| DeadlineStatus::between(at.date_naive(), today))
    }

    pub fn has_attachment(&self) -> bool {
        self.file_url.is_some()
    }
}

/// Parses a stored deadline
///
/// Accepts a bare calendar date (midnight UTC) or a full RFC 3339 timestamp. Empty and
/// malformed strings yield `None`.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// How far a deadline is from a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Deadline passed this many days ago
    Overdue(i64),

    DueToday,

    /// This many days remain
    DaysLeft(i64),
}

impl DeadlineStatus {
    pub fn between(deadline: NaiveDate, today: NaiveDate) -> Self {
        let days = (deadline - today).num_days();
        if days < 0 {
            DeadlineStatus::Overdue(-days)
        } else if days == 0 {
            DeadlineStatus::DueToday
        } else {
            DeadlineStatus::DaysLeft(days)
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, DeadlineStatus::Overdue(_))
    }

    /// Three days or less, but not yet overdue
    pub fn is_near(&self) -> bool {
        match self {
            DeadlineStatus::DueToday => true,
            DeadlineStatus::DaysLeft(days) => *days <= 3,
            DeadlineStatus::Overdue(_) => false,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DeadlineStatus::Overdue(days) => format!("{} days overdue", days),
            DeadlineStatus::DueToday => "Due today".to_string(),
            DeadlineStatus::DaysLeft(days) => format!("{} days left", days),
        }
    }
}

/// Insert payload for the `tasks` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub priority: Priority,
    pub status: WorkStatus,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub created_by: Uuid,
    pub created_by_name: String,
}

/// "Add task" form input
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskForm {
    #[validate(
        length(max = 255, message = "Title must be at most 255 characters"),
        custom(function = "validate_not_blank", message = "Title is required")
    )]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Option<Priority>,
}

/// File attached to a new task
#[derive(Debug, Clone)]
pub struct TaskAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: bytes::Bytes,
}

impl TaskAttachment {
    /// Extension used for the storage path, the text after the last dot
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_deadline_formats() {
        assert_eq!(
            parse_deadline("2024-06-01"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_deadline("2024-06-01T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(parse_deadline(""), None);
        assert_eq!(parse_deadline("   "), None);
        assert_eq!(parse_deadline("next friday"), None);
        assert_eq!(parse_deadline("2024-13-45"), None);
    }

    #[test]
    fn test_task_row_with_nulls() {
        let row = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "project_id": "550e8400-e29b-41d4-a716-446655440001",
            "title": "Draft brief",
            "description": null,
            "deadline": null,
            "priority": null,
            "status": "todo",
            "file_url": null,
            "file_name": null,
            "created_by": "550e8400-e29b-41d4-a716-446655440002",
            "created_by_name": "Ada",
            "created_at": "2024-05-01T12:00:00+00:00",
            "updated_at": "2024-05-01T12:00:00+00:00"
        });

        let task: Task = serde_json::from_value(row).unwrap();
        assert_eq!(task.effective_priority(), Priority::Medium);
        assert!(task.deadline_at().is_none());
        assert!(!task.has_attachment());
    }

    #[test]
    fn test_deadline_status() {
        let today = day(2024, 5, 10);
        assert_eq!(
            DeadlineStatus::between(day(2024, 5, 7), today),
            DeadlineStatus::Overdue(3)
        );
        assert_eq!(DeadlineStatus::between(today, today), DeadlineStatus::DueToday);
        assert_eq!(
            DeadlineStatus::between(day(2024, 5, 12), today),
            DeadlineStatus::DaysLeft(2)
        );

        assert!(DeadlineStatus::DaysLeft(3).is_near());
        assert!(!DeadlineStatus::DaysLeft(4).is_near());
        assert!(!DeadlineStatus::Overdue(1).is_near());
        assert_eq!(DeadlineStatus::Overdue(2).label(), "2 days overdue");
        assert_eq!(DeadlineStatus::DueToday.label(), "Due today");
    }

    #[test]
    fn test_form_rejects_blank_title() {
        let form = TaskForm {
            title: "  ".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        let form = TaskForm {
            title: "Write copy".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_attachment_extension() {
        let attachment = TaskAttachment {
            file_name: "brief.final.pdf".to_string(),
            content_type: None,
            data: bytes::Bytes::from_static(b"%PDF"),
        };
        assert_eq!(attachment.extension(), "pdf");
    }
}
