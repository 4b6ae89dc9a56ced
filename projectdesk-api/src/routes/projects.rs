/// Project endpoints
///
/// - `GET /v1/projects?search=&status=` - Visible projects, newest first
/// - `POST /v1/projects` - Create a project owned by the caller
/// - `GET /v1/projects/:id` - Project page: ranked tasks, comments, activity
/// - `PATCH /v1/projects/:id/status` - Move the project to another status

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::models::{Project, ProjectFilter, ProjectForm, WorkStatus};
use projectdesk_shared::services::projects::{self, ProjectDetails};
use serde::Deserialize;
use uuid::Uuid;

/// Body of the status endpoints
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: WorkStatus,
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Project>>> {
    let session = state.session(&auth);
    Ok(Json(projects::list_projects(&session, &filter).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<ProjectForm>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let session = state.session(&auth);
    let project = projects::create_project(&session, form).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Project page
///
/// Comments returned here are marked as read for the caller.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetails>> {
    let session = state.session(&auth);
    Ok(Json(projects::project_details(&session, project_id).await?))
}

pub async fn update_project_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Project>> {
    let session = state.session(&auth);
    Ok(Json(
        projects::update_project_status(&session, project_id, update.status).await?,
    ))
}
