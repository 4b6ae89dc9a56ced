/// Comment endpoints
///
/// - `GET|POST /v1/projects/:id/comments` - Project-level comments, newest first
/// - `GET|POST /v1/tasks/:id/comments` - Comments on a task, oldest first
///
/// Listing comments records read receipts for the caller.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::models::{Comment, CommentForm};
use projectdesk_shared::services::comments;
use uuid::Uuid;

pub async fn list_project_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let session = state.session(&auth);
    Ok(Json(comments::list_project_comments(&session, project_id).await?))
}

pub async fn add_project_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(form): Json<CommentForm>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let session = state.session(&auth);
    let comment = comments::add_project_comment(&session, project_id, form).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_task_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let session = state.session(&auth);
    Ok(Json(comments::list_task_comments(&session, task_id).await?))
}

pub async fn add_task_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(form): Json<CommentForm>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let session = state.session(&auth);
    let comment = comments::add_task_comment(&session, task_id, form).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
