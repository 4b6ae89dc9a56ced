//! Comment workflows
//!
//! Listing comments counts as viewing them: the viewer gets a read receipt for every
//! listed comment written by someone else.

use uuid::Uuid;
use validator::Validate;

use super::record_activity;
use crate::auth::identity::Identity;
use crate::error::{DeskError, DeskResult};
use crate::models::{
    ActivityAction, Comment, CommentForm, CommentQuery, CommentScope, CommentTarget, NewComment,
    ReadReceipt,
};
use crate::session::Session;

async fn mark_viewed(session: &Session, identity: &Identity, comments: &[Comment]) {
    let receipts: Vec<ReadReceipt> = comments
        .iter()
        .filter(|comment| !comment.is_authored_by(identity.id))
        .map(|comment| ReadReceipt::new(identity.id, comment.id))
        .collect();

    if receipts.is_empty() {
        return;
    }

    if let Err(e) = session.store().upsert_read_receipts(&receipts).await {
        tracing::error!(
            error = %e,
            user_id = %identity.id,
            count = receipts.len(),
            "Failed to record read receipts"
        );
    }
}

async fn insert(
    session: &Session,
    identity: &Identity,
    target: CommentTarget,
    project_id: Uuid,
    form: CommentForm,
) -> DeskResult<Comment> {
    form.validate()?;

    let comment = session
        .store()
        .insert_comment(NewComment::for_target(
            target,
            project_id,
            form.content.trim().to_string(),
            identity.id,
            identity.display_name(),
        ))
        .await?;

    tracing::info!(comment_id = %comment.id, project_id = %project_id, "Added comment");
    Ok(comment)
}

pub async fn add_project_comment(
    session: &Session,
    project_id: Uuid,
    form: CommentForm,
) -> DeskResult<Comment> {
    let identity = session.require_identity()?;
    let comment = insert(session, identity, CommentTarget::Project(project_id), project_id, form).await?;

    record_activity(
        session,
        identity,
        project_id,
        ActivityAction::ProjectCommentAdded,
        "Added comment on project".to_string(),
    )
    .await;

    Ok(comment)
}

pub async fn add_task_comment(session: &Session, task_id: Uuid, form: CommentForm) -> DeskResult<Comment> {
    let identity = session.require_identity()?;
    form.validate()?;

    let task = session
        .store()
        .get_task(task_id)
        .await?
        .ok_or_else(|| DeskError::NotFound("Task not found".to_string()))?;

    let comment = insert(session, identity, CommentTarget::Task(task_id), task.project_id, form).await?;

    record_activity(
        session,
        identity,
        task.project_id,
        ActivityAction::CommentAdded,
        "Added comment on task".to_string(),
    )
    .await;

    Ok(comment)
}

/// Project-level comments (not task comments), newest first
pub async fn list_project_comments(session: &Session, project_id: Uuid) -> DeskResult<Vec<Comment>> {
    let identity = session.require_identity()?;
    let comments = session
        .store()
        .list_comments(CommentQuery::new(CommentScope::ProjectLevel(project_id)))
        .await?;

    mark_viewed(session, identity, &comments).await;
    Ok(comments)
}

/// Comments on one task, oldest first
pub async fn list_task_comments(session: &Session, task_id: Uuid) -> DeskResult<Vec<Comment>> {
    let identity = session.require_identity()?;
    let comments = session
        .store()
        .list_comments(CommentQuery::new(CommentScope::Task(task_id)).oldest_first())
        .await?;

    mark_viewed(session, identity, &comments).await;
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Priority, WorkStatus};
    use crate::services::testing::{identity, Fixture};
    use crate::store::DataStore;

    fn form(content: &str) -> CommentForm {
        CommentForm {
            content: content.to_string(),
        }
    }

    async fn task(fixture: &Fixture, project_id: Uuid) -> Uuid {
        fixture
            .store
            .insert_task(NewTask {
                project_id,
                title: "Draft".to_string(),
                description: None,
                deadline: None,
                priority: Priority::Medium,
                status: WorkStatus::Todo,
                file_url: None,
                file_name: None,
                created_by: Uuid::new_v4(),
                created_by_name: "Ada".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_project_comment_is_trimmed_and_logged() {
        let fixture = Fixture::new();
        let ada = identity("Ada");
        let project = Uuid::new_v4();

        let comment = add_project_comment(&fixture.session(&ada), project, form("  Looks good  "))
            .await
            .unwrap();
        assert_eq!(comment.content, "Looks good");
        assert_eq!(comment.target(), Some(CommentTarget::Project(project)));
        assert_eq!(comment.created_by_name, "Ada");

        let activity = fixture.store.list_activity(Some(project)).await.unwrap();
        assert_eq!(activity[0].action, ActivityAction::ProjectCommentAdded);
        assert_eq!(activity[0].details, "Added comment on project");
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let fixture = Fixture::new();
        let err = add_project_comment(&fixture.session(&identity("Ada")), Uuid::new_v4(), form("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Validation(_)));
        assert_eq!(fixture.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_task_comment_carries_project() {
        let fixture = Fixture::new();
        let project = Uuid::new_v4();
        let task_id = task(&fixture, project).await;

        let comment = add_task_comment(&fixture.session(&identity("Ada")), task_id, form("On it"))
            .await
            .unwrap();
        assert_eq!(comment.target(), Some(CommentTarget::Task(task_id)));
        assert_eq!(comment.project_id, Some(project));

        let activity = fixture.store.list_activity(Some(project)).await.unwrap();
        assert_eq!(activity[0].action, ActivityAction::CommentAdded);

        let missing = add_task_comment(&fixture.session(&identity("Ada")), Uuid::new_v4(), form("x")).await;
        assert!(matches!(missing, Err(DeskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_listing_marks_others_comments_read() {
        let fixture = Fixture::new();
        let ada = identity("Ada");
        let grace = identity("Grace");
        let project = Uuid::new_v4();
        let task_id = task(&fixture, project).await;

        let mine = add_task_comment(&fixture.session(&ada), task_id, form("first")).await.unwrap();
        let theirs = add_task_comment(&fixture.session(&grace), task_id, form("second")).await.unwrap();
        add_project_comment(&fixture.session(&grace), project, form("project-level")).await.unwrap();

        let listed = list_task_comments(&fixture.session(&ada), task_id).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![mine.id, theirs.id]);

        let read = fixture.store.read_comment_ids(ada.id).await.unwrap();
        assert!(read.contains(&theirs.id));
        assert!(!read.contains(&mine.id));
        assert_eq!(read.len(), 1);

        let project_level = list_project_comments(&fixture.session(&ada), project).await.unwrap();
        assert_eq!(project_level.len(), 1);
        assert_eq!(fixture.store.read_comment_ids(ada.id).await.unwrap().len(), 2);
    }
}
