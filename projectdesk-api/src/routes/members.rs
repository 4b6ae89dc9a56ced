/// Member and invitation endpoints
///
/// - `GET /v1/projects/:id/members` - Members with their profiles
/// - `GET /v1/projects/:id/invitations` - Invitations, newest first
/// - `POST /v1/projects/:id/invitations` - Invite by email (owner only)
/// - `POST /v1/invitations/:id/cancel` - Withdraw a pending invitation (owner only)
/// - `POST /v1/invitations/:id/accept` - Join the project (invitee only)

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use projectdesk_shared::auth::middleware::AuthContext;
use projectdesk_shared::models::{InvitationForm, MemberWithProfile, ProjectInvitation, ProjectMember};
use projectdesk_shared::services::invitations;
use uuid::Uuid;

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberWithProfile>>> {
    let session = state.session(&auth);
    Ok(Json(invitations::list_members(&session, project_id).await?))
}

pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectInvitation>>> {
    let session = state.session(&auth);
    Ok(Json(invitations::list_invitations(&session, project_id).await?))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(form): Json<InvitationForm>,
) -> ApiResult<(StatusCode, Json<ProjectInvitation>)> {
    let session = state.session(&auth);
    let invitation = invitations::invite_member(&session, project_id, form).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn cancel_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<ProjectInvitation>> {
    let session = state.session(&auth);
    Ok(Json(
        invitations::cancel_invitation(&session, invitation_id).await?,
    ))
}

pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<Uuid>,
) -> ApiResult<Json<ProjectMember>> {
    let session = state.session(&auth);
    Ok(Json(
        invitations::accept_invitation(&session, invitation_id).await?,
    ))
}
