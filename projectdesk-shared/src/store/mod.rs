//! Data store seam
//!
//! Table-oriented reads and writes used by the workflows and the notification
//! reconciler. The hosted-platform implementation lives in
//! [`crate::platform::rest`]; [`MemoryStore`] keeps everything in process.
//!
//! Implementations bound to a user's access token only return rows that user may see.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::DeskResult;
use crate::models::{
    ActivityLog, Comment, CommentQuery, InvitationStatus, NewActivityLog, NewComment,
    NewInvitation, NewMember, NewProject, NewTask, Profile, Project, ProjectInvitation,
    ProjectMember, ReadReceipt, Task, WorkStatus,
};

pub use memory::MemoryStore;

/// Tables that record their author in `created_by`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthoredTable {
    Projects,
    Tasks,
    Comments,
}

impl AuthoredTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            AuthoredTable::Projects => "projects",
            AuthoredTable::Tasks => "tasks",
            AuthoredTable::Comments => "comments",
        }
    }
}

#[async_trait]
pub trait DataStore: Send + Sync {
    // projects

    /// All visible projects, newest first
    async fn list_projects(&self) -> DeskResult<Vec<Project>>;

    async fn get_project(&self, id: Uuid) -> DeskResult<Option<Project>>;

    async fn insert_project(&self, project: NewProject) -> DeskResult<Project>;

    async fn update_project_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Project>;

    // tasks

    /// Tasks of one project (or all visible tasks), newest first
    async fn list_tasks(&self, project_id: Option<Uuid>) -> DeskResult<Vec<Task>>;

    async fn get_task(&self, id: Uuid) -> DeskResult<Option<Task>>;

    async fn insert_task(&self, task: NewTask) -> DeskResult<Task>;

    async fn update_task_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Task>;

    // comments and read receipts

    async fn list_comments(&self, query: CommentQuery) -> DeskResult<Vec<Comment>>;

    async fn insert_comment(&self, comment: NewComment) -> DeskResult<Comment>;

    /// Ids of every comment the user has a receipt for
    async fn read_comment_ids(&self, user_id: Uuid) -> DeskResult<HashSet<Uuid>>;

    /// Inserts receipts, ignoring any that already exist for (user, comment)
    async fn upsert_read_receipts(&self, receipts: &[ReadReceipt]) -> DeskResult<()>;

    async fn upsert_read_receipt(&self, receipt: ReadReceipt) -> DeskResult<()> {
        self.upsert_read_receipts(std::slice::from_ref(&receipt)).await
    }

    // activity

    /// Activity of one project (or all visible projects), newest first
    async fn list_activity(&self, project_id: Option<Uuid>) -> DeskResult<Vec<ActivityLog>>;

    async fn insert_activity(&self, entry: NewActivityLog) -> DeskResult<ActivityLog>;

    // members and invitations

    /// Members of a project, most recently joined first
    async fn list_members(&self, project_id: Uuid) -> DeskResult<Vec<ProjectMember>>;

    async fn insert_member(&self, member: NewMember) -> DeskResult<ProjectMember>;

    /// Invitations of a project, newest first
    async fn list_invitations(&self, project_id: Uuid) -> DeskResult<Vec<ProjectInvitation>>;

    async fn get_invitation(&self, id: Uuid) -> DeskResult<Option<ProjectInvitation>>;

    async fn find_pending_invitation(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> DeskResult<Option<ProjectInvitation>>;

    async fn insert_invitation(&self, invitation: NewInvitation) -> DeskResult<ProjectInvitation>;

    async fn update_invitation_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
        accepted_at: Option<DateTime<Utc>>,
    ) -> DeskResult<ProjectInvitation>;

    // profiles

    async fn get_profile(&self, user_id: Uuid) -> DeskResult<Option<Profile>>;

    async fn list_profiles(&self, user_ids: &[Uuid]) -> DeskResult<Vec<Profile>>;

    async fn update_profile(&self, user_id: Uuid, full_name: Option<String>) -> DeskResult<Profile>;

    // counts

    /// Rows of `table` authored by the user
    async fn count_authored(&self, table: AuthoredTable, user_id: Uuid) -> DeskResult<u64>;
}
