//! Project workflows

use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::{comments, record_activity};
use crate::error::{DeskError, DeskResult};
use crate::models::validation::non_blank;
use crate::models::{
    ActivityAction, ActivityLog, Comment, MemberRole, NewMember, NewProject, Project,
    ProjectFilter, ProjectForm, Task, WorkStatus,
};
use crate::ranking::rank_tasks;
use crate::session::Session;

/// Everything the project page shows
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    pub project: Project,

    /// Ranked by deadline, then priority
    pub tasks: Vec<Task>,

    /// Project-level comments, newest first
    pub comments: Vec<Comment>,

    /// Newest first
    pub activity: Vec<ActivityLog>,

    pub is_owner: bool,
}

/// Creates a project owned by the signed-in identity
pub async fn create_project(session: &Session, form: ProjectForm) -> DeskResult<Project> {
    let identity = session.require_identity()?;
    form.validate()?;

    let title = form.title.trim().to_string();
    let project = session
        .store()
        .insert_project(NewProject {
            title: title.clone(),
            description: Some(form.description.trim().to_string()),
            goals: non_blank(form.goals),
            deadline: form.deadline,
            status: WorkStatus::Todo,
            created_by: identity.id,
            owner_id: identity.id,
        })
        .await?;

    tracing::info!(project_id = %project.id, user_id = %identity.id, "Created project");

    let membership = NewMember {
        project_id: project.id,
        user_id: identity.id,
        role: MemberRole::Owner,
    };
    match session.store().insert_member(membership).await {
        Ok(_) | Err(DeskError::Conflict(_)) => {}
        Err(e) => tracing::error!(error = %e, project_id = %project.id, "Failed to add owner membership"),
    }

    record_activity(
        session,
        identity,
        project.id,
        ActivityAction::ProjectCreated,
        format!("Created project: {}", title),
    )
    .await;

    Ok(project)
}

/// Visible projects matching the filter, newest first
pub async fn list_projects(session: &Session, filter: &ProjectFilter) -> DeskResult<Vec<Project>> {
    let identity = session.require_identity()?;
    let projects = session.store().list_projects().await.map_err(|e| {
        tracing::error!(error = %e, user_id = %identity.id, "Failed to list projects");
        e
    })?;

    Ok(projects.into_iter().filter(|p| filter.matches(p)).collect())
}

pub async fn get_project(session: &Session, project_id: Uuid) -> DeskResult<Project> {
    session.require_identity()?;
    session
        .store()
        .get_project(project_id)
        .await?
        .ok_or_else(|| DeskError::NotFound("Project not found".to_string()))
}

pub async fn update_project_status(
    session: &Session,
    project_id: Uuid,
    status: WorkStatus,
) -> DeskResult<Project> {
    let identity = session.require_identity()?;
    let project = session
        .store()
        .update_project_status(project_id, status)
        .await?;

    tracing::info!(project_id = %project_id, status = %status, "Updated project status");

    record_activity(
        session,
        identity,
        project_id,
        ActivityAction::StatusUpdated,
        format!("Updated project status to {}", status.phrase()),
    )
    .await;

    Ok(project)
}

/// Loads the project page; viewing the comments marks them read
pub async fn project_details(session: &Session, project_id: Uuid) -> DeskResult<ProjectDetails> {
    let identity = session.require_identity()?;
    let project = get_project(session, project_id).await?;

    let (tasks, comments, activity) = tokio::try_join!(
        session.store().list_tasks(Some(project_id)),
        comments::list_project_comments(session, project_id),
        session.store().list_activity(Some(project_id)),
    )?;

    Ok(ProjectDetails {
        is_owner: project.is_owned_by(identity.id),
        project,
        tasks: rank_tasks(&tasks),
        comments,
        activity,
    })
}
