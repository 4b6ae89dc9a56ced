//! Activity feed

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::DeskResult;
use crate::models::{ActivityCategory, ActivityFilter, ActivityLog};
use crate::session::Session;

/// Shown when an entry's project is gone or not visible
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Activity entry with the title of its project
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    #[serde(flatten)]
    pub log: ActivityLog,

    pub project_title: String,

    pub action_label: String,

    pub category: ActivityCategory,
}

/// Matching entries across visible projects, newest first
pub async fn list_activity(session: &Session, filter: &ActivityFilter) -> DeskResult<Vec<ActivityEntry>> {
    let identity = session.require_identity()?;

    let (logs, projects) = tokio::try_join!(
        session.store().list_activity(filter.project_id),
        session.store().list_projects(),
    )
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %identity.id, "Failed to load activity");
        e
    })?;

    let titles: HashMap<Uuid, String> = projects.into_iter().map(|p| (p.id, p.title)).collect();

    Ok(logs
        .into_iter()
        .filter(|log| filter.matches(log))
        .map(|log| ActivityEntry {
            project_title: titles
                .get(&log.project_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PROJECT.to_string()),
            action_label: log.action.label(),
            category: log.action.category(),
            log,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityAction, NewActivityLog, ProjectForm};
    use crate::services::projects::create_project;
    use crate::services::testing::{identity, Fixture};
    use crate::store::DataStore;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_entries_carry_project_titles() {
        let fixture = Fixture::new();
        let ada = identity("Ada");
        let session = fixture.session(&ada);

        let project = create_project(
            &session,
            ProjectForm {
                title: "Audit".to_string(),
                description: "Quarterly review".to_string(),
                goals: None,
                deadline: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            },
        )
        .await
        .unwrap();

        fixture
            .store
            .insert_activity(NewActivityLog {
                project_id: Uuid::new_v4(),
                user_id: ada.id,
                user_name: "Ada".to_string(),
                action: ActivityAction::Other("file_uploaded".to_string()),
                details: "Uploaded brief.pdf".to_string(),
            })
            .await
            .unwrap();

        let entries = list_activity(&session, &ActivityFilter::default()).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].project_title, UNKNOWN_PROJECT);
        assert_eq!(entries[0].action_label, "File Uploaded");
        assert_eq!(entries[1].project_title, "Audit");
        assert_eq!(entries[1].category, ActivityCategory::Project);

        let scoped = list_activity(
            &session,
            &ActivityFilter {
                search: Some("created".to_string()),
                project_id: Some(project.id),
            },
        )
        .await
        .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].log.details, "Created project: Audit");
    }
}
