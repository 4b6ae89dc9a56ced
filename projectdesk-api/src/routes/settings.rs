/// Settings page endpoints
///
/// - `GET /v1/me` - Identity, profile and contribution counts
/// - `PATCH /v1/me/profile` - Update the display name

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use projectdesk_shared::auth::{middleware::AuthContext, Identity};
use projectdesk_shared::models::{Profile, ProfileUpdate};
use projectdesk_shared::services::settings::{self, UserSettings};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: Identity,

    pub display_name: String,

    #[serde(flatten)]
    pub settings: UserSettings,
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let session = state.session(&auth);
    let settings = settings::user_settings(&session).await?;

    Ok(Json(MeResponse {
        display_name: auth.identity.display_name(),
        identity: auth.identity,
        settings,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let session = state.session(&auth);
    Ok(Json(settings::update_profile(&session, update).await?))
}
