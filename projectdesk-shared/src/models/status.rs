//! Workflow status and priority types shared by projects and tasks
//!
//! Both types serialize to the lowercase tags the platform tables store
//! (`todo`, `in_progress`, `done` / `urgent`, `high`, `medium`, `low`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress state of a project or a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Not started
    #[default]
    Todo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl WorkStatus {
    /// All statuses in display order
    pub const ALL: [WorkStatus; 3] = [WorkStatus::Todo, WorkStatus::InProgress, WorkStatus::Done];

    /// Tag stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Todo => "todo",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Done => "done",
        }
    }

    /// Label shown on badges
    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::Todo => "To Do",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::Done => "Done",
        }
    }

    /// Lowercase phrase used inside activity log details ("in progress")
    pub fn phrase(&self) -> &'static str {
        match self {
            WorkStatus::Todo => "todo",
            WorkStatus::InProgress => "in progress",
            WorkStatus::Done => "done",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(WorkStatus::Todo),
            "in_progress" => Ok(WorkStatus::InProgress),
            "done" => Ok(WorkStatus::Done),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Task urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lower comes first: urgent(0) < high(1) < medium(2) < low(3)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}
