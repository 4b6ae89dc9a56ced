//! In-process data store
//!
//! Backs local development and the test suites. Rows live in vectors in insertion
//! order, so "newest first" is reverse insertion order. Inserts into `comments`,
//! `tasks`, `activity_logs` and `comment_read_status` are published on the attached
//! [`MemoryFeed`], mirroring the platform's insert trigger.
//!
//! There is no row-level security: every session sees every row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthoredTable, DataStore};
use crate::error::{DeskError, DeskResult};
use crate::feed::{ChangeEvent, MemoryFeed};
use crate::models::{
    ActivityLog, Comment, CommentQuery, CommentReadStatus, InvitationStatus, NewActivityLog,
    NewComment, NewInvitation, NewMember, NewProject, NewTask, Profile, Project,
    ProjectInvitation, ProjectMember, ReadReceipt, Task, WorkStatus,
};

#[derive(Debug, Default)]
struct Tables {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    receipts: Vec<CommentReadStatus>,
    activity: Vec<ActivityLog>,
    members: Vec<ProjectMember>,
    invitations: Vec<ProjectInvitation>,
    profiles: HashMap<Uuid, Profile>,
}

/// Shared in-memory tables; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    feed: MemoryFeed,
    failing: Arc<AtomicBool>,
    activity_failing: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed that receives this store's inserts
    pub fn feed(&self) -> MemoryFeed {
        self.feed.clone()
    }

    /// Makes every subsequent call fail like an unreachable platform
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes only activity-log inserts fail
    pub fn set_activity_failing(&self, failing: bool) {
        self.activity_failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful write calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Creates or replaces a profile, as the platform does on sign-up
    pub async fn put_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    /// Number of receipts stored for (user, comment)
    pub async fn receipt_count(&self, user_id: Uuid, comment_id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .receipts
            .iter()
            .filter(|r| r.user_id == user_id && r.comment_id == comment_id)
            .count()
    }

    fn check_available(&self) -> DeskResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeskError::Platform {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn publish<T: Serialize>(&self, table: &str, row: &T) {
        match serde_json::to_value(row) {
            Ok(record) => self.feed.publish(ChangeEvent::insert(table, record)),
            Err(e) => tracing::error!(error = %e, table, "Failed to encode change event"),
        }
    }
}

fn newest_first<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().rev().filter(|row| keep(row)).cloned().collect()
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_projects(&self) -> DeskResult<Vec<Project>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.projects, |_| true))
    }

    async fn get_project(&self, id: Uuid) -> DeskResult<Option<Project>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_project(&self, project: NewProject) -> DeskResult<Project> {
        self.check_available()?;
        let now = Utc::now();
        let row = Project {
            id: Uuid::new_v4(),
            title: project.title,
            description: project.description,
            goals: project.goals,
            deadline: project.deadline,
            status: project.status,
            created_by: project.created_by,
            owner_id: project.owner_id,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.projects.push(row.clone());
        self.record_write();
        Ok(row)
    }

    async fn update_project_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Project> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DeskError::NotFound("Project not found".to_string()))?;

        project.status = status;
        project.updated_at = Utc::now();
        let updated = project.clone();
        drop(tables);

        self.record_write();
        Ok(updated)
    }

    async fn list_tasks(&self, project_id: Option<Uuid>) -> DeskResult<Vec<Task>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.tasks, |t| {
            project_id.map(|id| t.project_id == id).unwrap_or(true)
        }))
    }

    async fn get_task(&self, id: Uuid) -> DeskResult<Option<Task>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_task(&self, task: NewTask) -> DeskResult<Task> {
        self.check_available()?;
        let now = Utc::now();
        let row = Task {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            deadline: task.deadline,
            priority: Some(task.priority),
            status: task.status,
            file_url: task.file_url,
            file_name: task.file_name,
            created_by: task.created_by,
            created_by_name: task.created_by_name,
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.tasks.push(row.clone());
        self.record_write();
        self.publish("tasks", &row);
        Ok(row)
    }

    async fn update_task_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Task> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DeskError::NotFound("Task not found".to_string()))?;

        task.status = status;
        task.updated_at = Utc::now();
        let updated = task.clone();
        drop(tables);

        self.record_write();
        Ok(updated)
    }

    async fn list_comments(&self, query: CommentQuery) -> DeskResult<Vec<Comment>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        if query.ascending {
            Ok(tables
                .comments
                .iter()
                .filter(|c| query.matches(c))
                .cloned()
                .collect())
        } else {
            Ok(newest_first(&tables.comments, |c| query.matches(c)))
        }
    }

    async fn insert_comment(&self, comment: NewComment) -> DeskResult<Comment> {
        self.check_available()?;
        let row = Comment {
            id: Uuid::new_v4(),
            project_id: comment.project_id,
            task_id: comment.task_id,
            content: comment.content,
            created_by: comment.created_by,
            created_by_name: comment.created_by_name,
            created_at: Utc::now(),
        };

        self.tables.write().await.comments.push(row.clone());
        self.record_write();
        self.publish("comments", &row);
        Ok(row)
    }

    async fn read_comment_ids(&self, user_id: Uuid) -> DeskResult<HashSet<Uuid>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .receipts
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.comment_id)
            .collect())
    }

    async fn upsert_read_receipts(&self, receipts: &[ReadReceipt]) -> DeskResult<()> {
        self.check_available()?;
        if receipts.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut inserted = Vec::new();
        let mut tables = self.tables.write().await;
        for receipt in receipts {
            let exists = tables
                .receipts
                .iter()
                .any(|r| r.user_id == receipt.user_id && r.comment_id == receipt.comment_id);
            if !exists {
                let row = CommentReadStatus {
                    id: Uuid::new_v4(),
                    user_id: receipt.user_id,
                    comment_id: receipt.comment_id,
                    read_at: now,
                    created_at: now,
                };
                tables.receipts.push(row.clone());
                inserted.push(row);
            }
        }
        drop(tables);

        self.record_write();
        // conflicting rows are skipped like ON CONFLICT DO NOTHING, so they fire nothing
        for row in &inserted {
            self.publish("comment_read_status", row);
        }
        Ok(())
    }

    async fn list_activity(&self, project_id: Option<Uuid>) -> DeskResult<Vec<ActivityLog>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.activity, |a| {
            project_id.map(|id| a.project_id == id).unwrap_or(true)
        }))
    }

    async fn insert_activity(&self, entry: NewActivityLog) -> DeskResult<ActivityLog> {
        self.check_available()?;
        if self.activity_failing.load(Ordering::SeqCst) {
            return Err(DeskError::Platform {
                status: 500,
                message: "activity_logs insert failed".to_string(),
            });
        }
        let row = ActivityLog {
            id: Uuid::new_v4(),
            project_id: entry.project_id,
            user_id: entry.user_id,
            user_name: entry.user_name,
            action: entry.action,
            details: entry.details,
            created_at: Utc::now(),
        };

        self.tables.write().await.activity.push(row.clone());
        self.record_write();
        self.publish("activity_logs", &row);
        Ok(row)
    }

    async fn list_members(&self, project_id: Uuid) -> DeskResult<Vec<ProjectMember>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.members, |m| m.project_id == project_id))
    }

    async fn insert_member(&self, member: NewMember) -> DeskResult<ProjectMember> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(DeskError::Conflict("User is already a member".to_string()));
        }

        let row = ProjectMember {
            id: Uuid::new_v4(),
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: Some(Utc::now()),
        };
        tables.members.push(row.clone());
        drop(tables);

        self.record_write();
        Ok(row)
    }

    async fn list_invitations(&self, project_id: Uuid) -> DeskResult<Vec<ProjectInvitation>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.invitations, |i| i.project_id == project_id))
    }

    async fn get_invitation(&self, id: Uuid) -> DeskResult<Option<ProjectInvitation>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.invitations.iter().find(|i| i.id == id).cloned())
    }

    async fn find_pending_invitation(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> DeskResult<Option<ProjectInvitation>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .invitations
            .iter()
            .find(|i| {
                i.project_id == project_id
                    && i.status == InvitationStatus::Pending
                    && i.is_for(email)
            })
            .cloned())
    }

    async fn insert_invitation(&self, invitation: NewInvitation) -> DeskResult<ProjectInvitation> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.invitations.iter().any(|i| {
            i.project_id == invitation.project_id
                && i.status == InvitationStatus::Pending
                && i.is_for(&invitation.email)
        }) {
            return Err(DeskError::Conflict(
                "An invitation has already been sent to this email".to_string(),
            ));
        }

        let now = Utc::now();
        let row = ProjectInvitation {
            id: Uuid::new_v4(),
            project_id: invitation.project_id,
            email: invitation.email,
            role: invitation.role,
            status: InvitationStatus::Pending,
            invited_by: invitation.invited_by,
            invited_at: Some(now),
            expires_at: Some(NewInvitation::expiry_from(now)),
            accepted_at: None,
        };
        tables.invitations.push(row.clone());
        drop(tables);

        self.record_write();
        Ok(row)
    }

    async fn update_invitation_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
        accepted_at: Option<DateTime<Utc>>,
    ) -> DeskResult<ProjectInvitation> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let invitation = tables
            .invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DeskError::NotFound("Invitation not found".to_string()))?;

        invitation.status = status;
        if accepted_at.is_some() {
            invitation.accepted_at = accepted_at;
        }
        let updated = invitation.clone();
        drop(tables);

        self.record_write();
        Ok(updated)
    }

    async fn get_profile(&self, user_id: Uuid) -> DeskResult<Option<Profile>> {
        self.check_available()?;
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn list_profiles(&self, user_ids: &[Uuid]) -> DeskResult<Vec<Profile>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }

    async fn update_profile(&self, user_id: Uuid, full_name: Option<String>) -> DeskResult<Profile> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&user_id)
            .ok_or_else(|| DeskError::NotFound("Profile not found".to_string()))?;

        profile.full_name = full_name;
        profile.updated_at = Some(Utc::now());
        let updated = profile.clone();
        drop(tables);

        self.record_write();
        Ok(updated)
    }

    async fn count_authored(&self, table: AuthoredTable, user_id: Uuid) -> DeskResult<u64> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let count = match table {
            AuthoredTable::Projects => tables.projects.iter().filter(|p| p.created_by == user_id).count(),
            AuthoredTable::Tasks => tables.tasks.iter().filter(|t| t.created_by == user_id).count(),
            AuthoredTable::Comments => tables.comments.iter().filter(|c| c.created_by == user_id).count(),
        };
        Ok(count as u64)
    }
}
