//! Table access over the platform's REST API
//!
//! Filters are query parameters of the form `column=op.value` (`eq`, `neq`, `is.null`,
//! `in.(a,b)`), ordering is `order=column.asc|desc`. Writes ask for the written rows back
//! with `Prefer: return=representation`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use super::{check, PlatformClient};
use crate::error::{DeskError, DeskResult};
use crate::models::{
    ActivityLog, Comment, CommentQuery, CommentScope, InvitationStatus, NewActivityLog, NewComment,
    NewInvitation, NewMember, NewProject, NewTask, Profile, Project, ProjectInvitation,
    ProjectMember, ReadReceipt, Task, WorkStatus,
};
use crate::store::{AuthoredTable, DataStore};

const RETURN_REPRESENTATION: &str = "return=representation";

/// Query-string builder for table requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestQuery {
    params: Vec<(String, String)>,
}

impl RestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn select(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.push(column, format!("eq.{}", value.to_string()))
    }

    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.push(column, format!("neq.{}", value.to_string()))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.push(column, "is.null".to_string())
    }

    pub fn in_list<T: ToString>(self, column: &str, values: &[T]) -> Self {
        let list = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.push(column, format!("in.({})", list))
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.push("order", format!("{}.{}", column, direction))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.push("limit", limit.to_string())
    }

    pub fn on_conflict(self, columns: &str) -> Self {
        self.push("on_conflict", columns.to_string())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

/// Filters for a comment query
pub fn comment_query(query: &CommentQuery) -> RestQuery {
    let rest = RestQuery::new().select("*");
    let rest = match query.scope {
        CommentScope::All => rest,
        CommentScope::Project(id) => rest.eq("project_id", id),
        CommentScope::ProjectLevel(id) => rest.eq("project_id", id).is_null("task_id"),
        CommentScope::Task(id) => rest.eq("task_id", id),
    };
    let rest = match query.exclude_author {
        Some(user_id) => rest.neq("created_by", user_id),
        None => rest,
    };
    rest.order("created_at", query.ascending)
}

/// Total from a `Content-Range` header (`0-24/57`, `*/0`)
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next().and_then(|total| total.parse().ok())
}

#[derive(Serialize)]
struct InvitationInsert<'a> {
    #[serde(flatten)]
    invitation: &'a NewInvitation,
    status: InvitationStatus,
    invited_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReceiptInsert {
    #[serde(flatten)]
    receipt: ReadReceipt,
    read_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct StatusPatch {
    status: WorkStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct InvitationPatch {
    status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ProfilePatch {
    full_name: Option<String>,
    updated_at: DateTime<Utc>,
}

/// [`DataStore`] bound to one user's access token
#[derive(Debug, Clone)]
pub struct PlatformStore {
    client: PlatformClient,
    access_token: String,
}

impl PlatformStore {
    pub fn new(client: PlatformClient, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.client.config().rest_url(), table)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: RestQuery) -> DeskResult<Vec<T>> {
        let response = self
            .client
            .request(Method::GET, &self.table_url(table), Some(&self.access_token))
            .query(query.params())
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, query: RestQuery) -> DeskResult<Option<T>> {
        let rows: Vec<T> = self.select(table, query.limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(&self, table: &str, row: &B) -> DeskResult<T> {
        let response = self
            .client
            .request(Method::POST, &self.table_url(table), Some(&self.access_token))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&[row])
            .send()
            .await?;

        let rows: Vec<T> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| DeskError::Platform {
            status: 200,
            message: format!("insert into {} returned no row", table),
        })
    }

    async fn update<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
        patch: &B,
    ) -> DeskResult<T> {
        let response = self
            .client
            .request(Method::PATCH, &self.table_url(table), Some(&self.access_token))
            .header("Prefer", RETURN_REPRESENTATION)
            .query(RestQuery::new().eq("id", id).params())
            .json(patch)
            .send()
            .await?;

        let rows: Vec<T> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DeskError::NotFound(format!("No {} row with id {}", table, id)))
    }
}

#[async_trait]
impl DataStore for PlatformStore {
    async fn list_projects(&self) -> DeskResult<Vec<Project>> {
        self.select("projects", RestQuery::new().select("*").order("created_at", false))
            .await
    }

    async fn get_project(&self, id: Uuid) -> DeskResult<Option<Project>> {
        self.select_one("projects", RestQuery::new().select("*").eq("id", id))
            .await
    }

    async fn insert_project(&self, project: NewProject) -> DeskResult<Project> {
        self.insert("projects", &project).await
    }

    async fn update_project_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Project> {
        let patch = StatusPatch {
            status,
            updated_at: Utc::now(),
        };
        self.update("projects", id, &patch).await
    }

    async fn list_tasks(&self, project_id: Option<Uuid>) -> DeskResult<Vec<Task>> {
        let query = RestQuery::new().select("*");
        let query = match project_id {
            Some(id) => query.eq("project_id", id),
            None => query,
        };
        self.select("tasks", query.order("created_at", false)).await
    }

    async fn get_task(&self, id: Uuid) -> DeskResult<Option<Task>> {
        self.select_one("tasks", RestQuery::new().select("*").eq("id", id))
            .await
    }

    async fn insert_task(&self, task: NewTask) -> DeskResult<Task> {
        self.insert("tasks", &task).await
    }

    async fn update_task_status(&self, id: Uuid, status: WorkStatus) -> DeskResult<Task> {
        let patch = StatusPatch {
            status,
            updated_at: Utc::now(),
        };
        self.update("tasks", id, &patch).await
    }

    async fn list_comments(&self, query: CommentQuery) -> DeskResult<Vec<Comment>> {
        self.select("comments", comment_query(&query)).await
    }

    async fn insert_comment(&self, comment: NewComment) -> DeskResult<Comment> {
        self.insert("comments", &comment).await
    }

    async fn read_comment_ids(&self, user_id: Uuid) -> DeskResult<HashSet<Uuid>> {
        #[derive(serde::Deserialize)]
        struct Row {
            comment_id: Uuid,
        }

        let rows: Vec<Row> = self
            .select(
                "comment_read_status",
                RestQuery::new().select("comment_id").eq("user_id", user_id),
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.comment_id).collect())
    }

    async fn upsert_read_receipts(&self, receipts: &[ReadReceipt]) -> DeskResult<()> {
        if receipts.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let rows: Vec<ReceiptInsert> = receipts
            .iter()
            .map(|receipt| ReceiptInsert {
                receipt: *receipt,
                read_at: now,
            })
            .collect();

        let response = self
            .client
            .request(
                Method::POST,
                &self.table_url("comment_read_status"),
                Some(&self.access_token),
            )
            .header("Prefer", "resolution=ignore-duplicates,return=minimal")
            .query(RestQuery::new().on_conflict("user_id,comment_id").params())
            .json(&rows)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn list_activity(&self, project_id: Option<Uuid>) -> DeskResult<Vec<ActivityLog>> {
        let query = RestQuery::new().select("*");
        let query = match project_id {
            Some(id) => query.eq("project_id", id),
            None => query,
        };
        self.select("activity_logs", query.order("created_at", false))
            .await
    }

    async fn insert_activity(&self, entry: NewActivityLog) -> DeskResult<ActivityLog> {
        self.insert("activity_logs", &entry).await
    }

    async fn list_members(&self, project_id: Uuid) -> DeskResult<Vec<ProjectMember>> {
        self.select(
            "project_members",
            RestQuery::new()
                .select("*")
                .eq("project_id", project_id)
                .order("joined_at", false),
        )
        .await
    }

    async fn insert_member(&self, member: NewMember) -> DeskResult<ProjectMember> {
        self.insert("project_members", &member).await
    }

    async fn list_invitations(&self, project_id: Uuid) -> DeskResult<Vec<ProjectInvitation>> {
        self.select(
            "project_invitations",
            RestQuery::new()
                .select("*")
                .eq("project_id", project_id)
                .order("invited_at", false),
        )
        .await
    }

    async fn get_invitation(&self, id: Uuid) -> DeskResult<Option<ProjectInvitation>> {
        self.select_one("project_invitations", RestQuery::new().select("*").eq("id", id))
            .await
    }

    async fn find_pending_invitation(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> DeskResult<Option<ProjectInvitation>> {
        self.select_one(
            "project_invitations",
            RestQuery::new()
                .select("*")
                .eq("project_id", project_id)
                .eq("email", email.trim().to_lowercase())
                .eq("status", InvitationStatus::Pending.as_str()),
        )
        .await
    }

    async fn insert_invitation(&self, invitation: NewInvitation) -> DeskResult<ProjectInvitation> {
        let now = Utc::now();
        let row = InvitationInsert {
            invitation: &invitation,
            status: InvitationStatus::Pending,
            invited_at: now,
            expires_at: NewInvitation::expiry_from(now),
        };
        self.insert("project_invitations", &row).await
    }

    async fn update_invitation_status(
        &self,
        id: Uuid,
        status: InvitationStatus,
        accepted_at: Option<DateTime<Utc>>,
    ) -> DeskResult<ProjectInvitation> {
        let patch = InvitationPatch { status, accepted_at };
        self.update("project_invitations", id, &patch).await
    }

    async fn get_profile(&self, user_id: Uuid) -> DeskResult<Option<Profile>> {
        self.select_one("profiles", RestQuery::new().select("*").eq("id", user_id))
            .await
    }

    async fn list_profiles(&self, user_ids: &[Uuid]) -> DeskResult<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select("profiles", RestQuery::new().select("*").in_list("id", user_ids))
            .await
    }

    async fn update_profile(&self, user_id: Uuid, full_name: Option<String>) -> DeskResult<Profile> {
        let patch = ProfilePatch {
            full_name,
            updated_at: Utc::now(),
        };
        self.update("profiles", user_id, &patch).await
    }

    async fn count_authored(&self, table: AuthoredTable, user_id: Uuid) -> DeskResult<u64> {
        let response = self
            .client
            .request(
                Method::GET,
                &self.table_url(table.table_name()),
                Some(&self.access_token),
            )
            .header("Prefer", "count=exact")
            .query(
                RestQuery::new()
                    .select("id")
                    .eq("created_by", user_id)
                    .limit(1)
                    .params(),
            )
            .send()
            .await?;

        let response = check(response).await?;
        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| DeskError::Platform {
                status: response.status().as_u16(),
                message: format!("missing row count for {}", table.table_name()),
            })
    }
}
