/// Dashboard endpoint
///
/// ```text
/// GET /v1/dashboard
/// ```
///
/// Returns project and task counts per status plus the five newest projects.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::services::dashboard::{self, Dashboard};

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Dashboard>> {
    let session = state.session(&auth);
    Ok(Json(dashboard::dashboard(&session).await?))
}
