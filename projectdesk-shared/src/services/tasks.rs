//! Task workflows

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::record_activity;
use crate::blob::task_attachment_path;
use crate::error::DeskResult;
use crate::models::validation::non_blank;
use crate::models::{ActivityAction, NewTask, Task, TaskAttachment, TaskForm, WorkStatus};
use crate::ranking::rank_tasks;
use crate::session::Session;

/// Uploads an attachment and returns its public URL
async fn upload_attachment(
    session: &Session,
    project_id: Uuid,
    attachment: TaskAttachment,
) -> DeskResult<String> {
    let path = task_attachment_path(
        project_id,
        Utc::now().timestamp_millis(),
        attachment.extension(),
    );

    session
        .blobs()
        .upload(&path, attachment.data, attachment.content_type.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to upload task attachment");
            e
        })?;

    Ok(session.blobs().public_url(&path))
}

/// Adds a task to a project
///
/// The form is validated before the attachment is uploaded, so a rejected form never
/// leaves an orphaned file behind.
pub async fn create_task(
    session: &Session,
    project_id: Uuid,
    form: TaskForm,
    attachment: Option<TaskAttachment>,
) -> DeskResult<Task> {
    let identity = session.require_identity()?;
    form.validate()?;

    let (file_url, file_name) = match attachment {
        Some(attachment) => {
            let file_name = attachment.file_name.clone();
            let url = upload_attachment(session, project_id, attachment).await?;
            (Some(url), Some(file_name))
        }
        None => (None, None),
    };

    let title = form.title.trim().to_string();
    let task = session
        .store()
        .insert_task(NewTask {
            project_id,
            title: title.clone(),
            description: non_blank(form.description),
            deadline: form.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
            priority: form.priority.unwrap_or_default(),
            status: WorkStatus::Todo,
            file_url,
            file_name,
            created_by: identity.id,
            created_by_name: identity.display_name(),
        })
        .await?;

    tracing::info!(task_id = %task.id, project_id = %project_id, "Created task");

    record_activity(
        session,
        identity,
        project_id,
        ActivityAction::TaskCreated,
        format!("Created task: {}", title),
    )
    .await;

    Ok(task)
}

pub async fn update_task_status(session: &Session, task_id: Uuid, status: WorkStatus) -> DeskResult<Task> {
    let identity = session.require_identity()?;
    let task = session.store().update_task_status(task_id, status).await?;

    tracing::info!(task_id = %task_id, status = %status, "Updated task status");

    record_activity(
        session,
        identity,
        task.project_id,
        ActivityAction::TaskStatusUpdated,
        format!("Updated task \"{}\" status to {}", task.title, status.phrase()),
    )
    .await;

    Ok(task)
}

/// Tasks of a project, by deadline then priority
pub async fn list_ranked_tasks(session: &Session, project_id: Uuid) -> DeskResult<Vec<Task>> {
    session.require_identity()?;
    let tasks = session.store().list_tasks(Some(project_id)).await?;
    Ok(rank_tasks(&tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeskError;
    use crate::models::Priority;
    use crate::services::testing::{identity, Fixture};
    use crate::store::DataStore;
    use bytes::Bytes;
    use chrono::NaiveDate;

    fn form(title: &str) -> TaskForm {
        TaskForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn attachment() -> TaskAttachment {
        TaskAttachment {
            file_name: "brief.final.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn test_empty_title_rejected_before_any_write() {
        let fixture = Fixture::new();
        let session = fixture.session(&identity("Ada"));

        let err = create_task(&session, Uuid::new_v4(), form(""), Some(attachment()))
            .await
            .unwrap_err();

        assert!(matches!(err, DeskError::Validation(_)));
        assert!(fixture.blobs.is_empty());
        assert_eq!(fixture.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_create_task_with_attachment() {
        let fixture = Fixture::new();
        let session = fixture.session(&identity("Ada"));
        let project = Uuid::new_v4();

        let task = create_task(
            &session,
            project,
            TaskForm {
                title: "Write brief".to_string(),
                description: Some("   ".to_string()),
                deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
                priority: None,
            },
            Some(attachment()),
        )
        .await
        .unwrap();

        assert_eq!(task.priority, Some(Priority::Medium));
        assert_eq!(task.deadline.as_deref(), Some("2024-06-01"));
        assert!(task.description.is_none());
        assert_eq!(task.file_name.as_deref(), Some("brief.final.pdf"));

        let url = task.file_url.unwrap();
        let prefix = format!(
            "http://localhost:8080/storage/v1/object/public/project-files/task-files/{}/",
            project
        );
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".pdf"));
        assert_eq!(fixture.blobs.len(), 1);

        let activity = fixture.store.list_activity(Some(project)).await.unwrap();
        assert_eq!(activity[0].details, "Created task: Write brief");
    }

    #[tokio::test]
    async fn test_status_update_detail() {
        let fixture = Fixture::new();
        let session = fixture.session(&identity("Ada"));
        let project = Uuid::new_v4();
        let task = create_task(&session, project, form("Write brief"), None).await.unwrap();

        update_task_status(&session, task.id, WorkStatus::InProgress).await.unwrap();

        let activity = fixture.store.list_activity(Some(project)).await.unwrap();
        assert_eq!(activity[0].action, ActivityAction::TaskStatusUpdated);
        assert_eq!(
            activity[0].details,
            "Updated task \"Write brief\" status to in progress"
        );
    }

    #[tokio::test]
    async fn test_list_ranked_tasks() {
        let fixture = Fixture::new();
        let session = fixture.session(&identity("Ada"));
        let project = Uuid::new_v4();

        let undated = TaskForm {
            title: "undated".to_string(),
            priority: Some(Priority::Urgent),
            ..Default::default()
        };
        let late = TaskForm {
            title: "late".to_string(),
            deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        let early = TaskForm {
            title: "early".to_string(),
            deadline: NaiveDate::from_ymd_opt(2024, 5, 1),
            priority: Some(Priority::High),
            ..Default::default()
        };
        for form in [late, undated, early] {
            create_task(&session, project, form, None).await.unwrap();
        }

        let titles: Vec<String> = list_ranked_tasks(&session, project)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["early", "late", "undated"]);
    }
}
