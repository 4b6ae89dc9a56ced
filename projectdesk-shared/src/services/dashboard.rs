//! Dashboard summary

use serde::Serialize;

use crate::error::DeskResult;
use crate::models::{Project, WorkStatus};
use crate::session::Session;

/// Number of projects listed under "recent"
pub const RECENT_PROJECTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn from_statuses(statuses: impl IntoIterator<Item = WorkStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            counts.total += 1;
            match status {
                WorkStatus::Todo => counts.todo += 1,
                WorkStatus::InProgress => counts.in_progress += 1,
                WorkStatus::Done => counts.done += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub projects: StatusCounts,
    pub tasks: StatusCounts,

    /// Newest first
    pub recent_projects: Vec<Project>,
}

pub async fn dashboard(session: &Session) -> DeskResult<Dashboard> {
    let identity = session.require_identity()?;

    let (projects, tasks) = tokio::try_join!(
        session.store().list_projects(),
        session.store().list_tasks(None),
    )
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %identity.id, "Failed to load dashboard");
        e
    })?;

    Ok(Dashboard {
        projects: StatusCounts::from_statuses(projects.iter().map(|p| p.status)),
        tasks: StatusCounts::from_statuses(tasks.iter().map(|t| t.status)),
        recent_projects: projects.into_iter().take(RECENT_PROJECTS).collect(),
    })
}
