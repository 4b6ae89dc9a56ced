/// Activity log endpoints
///
/// - `GET /v1/activity?search=&project_id=` - Entries across visible projects
/// - `GET /v1/projects/:id/activity?search=` - Entries of one project
///
/// Entries are newest first and carry their project's title, a display label and a
/// category for rendering.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::models::ActivityFilter;
use projectdesk_shared::services::activity::{self, ActivityEntry};
use uuid::Uuid;

pub async fn list_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<ActivityFilter>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    let session = state.session(&auth);
    Ok(Json(activity::list_activity(&session, &filter).await?))
}

pub async fn project_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(filter): Query<ActivityFilter>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    let session = state.session(&auth);
    let filter = ActivityFilter {
        project_id: Some(project_id),
        ..filter
    };
    Ok(Json(activity::list_activity(&session, &filter).await?))
}
