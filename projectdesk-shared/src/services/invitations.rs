//! Membership and invitation workflows
//!
//! Only the project owner sends or cancels invitations. An invitation is accepted by
//! the identity whose email it was sent to, while it is pending and unexpired.

use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::projects::get_project;
use super::record_activity;
use crate::auth::authorization::{require_invitee, require_owner};
use crate::error::{DeskError, DeskResult};
use crate::models::{
    ActivityAction, InvitationForm, InvitationStatus, MemberWithProfile, NewInvitation, NewMember,
    ProjectInvitation, ProjectMember,
};
use crate::session::Session;

async fn load_invitation(session: &Session, invitation_id: Uuid) -> DeskResult<ProjectInvitation> {
    session
        .store()
        .get_invitation(invitation_id)
        .await?
        .ok_or_else(|| DeskError::NotFound("Invitation not found".to_string()))
}

/// Members of a project with their profiles, most recently joined first
pub async fn list_members(session: &Session, project_id: Uuid) -> DeskResult<Vec<MemberWithProfile>> {
    session.require_identity()?;
    let members = session.store().list_members(project_id).await?;

    let user_ids: Vec<Uuid> = members.iter().map(|m| m.user_id).collect();
    let mut profiles: HashMap<Uuid, _> = session
        .store()
        .list_profiles(&user_ids)
        .await?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect();

    Ok(members
        .into_iter()
        .map(|member| MemberWithProfile {
            profile: profiles.remove(&member.user_id),
            member,
        })
        .collect())
}

/// Invitations of a project, newest first
pub async fn list_invitations(session: &Session, project_id: Uuid) -> DeskResult<Vec<ProjectInvitation>> {
    session.require_identity()?;
    session.store().list_invitations(project_id).await
}

/// Sends an invitation to join a project
pub async fn invite_member(
    session: &Session,
    project_id: Uuid,
    form: InvitationForm,
) -> DeskResult<ProjectInvitation> {
    let identity = session.require_identity()?;
    form.validate()?;
    if !form.role.is_invitable() {
        return Err(DeskError::invalid("role", "Role must be admin or member"));
    }

    let project = get_project(session, project_id).await?;
    require_owner(identity, &project)?;

    let email = form.email.trim().to_lowercase();

    let members = list_members(session, project_id).await?;
    if members
        .iter()
        .any(|m| m.email().map(|e| e.eq_ignore_ascii_case(&email)).unwrap_or(false))
    {
        return Err(DeskError::Conflict(
            "User is already a member of this project".to_string(),
        ));
    }

    if session
        .store()
        .find_pending_invitation(project_id, &email)
        .await?
        .is_some()
    {
        return Err(DeskError::Conflict(
            "An invitation has already been sent to this email".to_string(),
        ));
    }

    let invitation = session
        .store()
        .insert_invitation(NewInvitation {
            project_id,
            email: email.clone(),
            role: form.role,
            invited_by: identity.id,
        })
        .await?;

    tracing::info!(invitation_id = %invitation.id, project_id = %project_id, "Sent invitation");

    record_activity(
        session,
        identity,
        project_id,
        ActivityAction::MemberInvited,
        format!("Invited {} as {}", email, form.role),
    )
    .await;

    Ok(invitation)
}

/// Withdraws a pending invitation; it is kept as declined
pub async fn cancel_invitation(session: &Session, invitation_id: Uuid) -> DeskResult<ProjectInvitation> {
    let identity = session.require_identity()?;
    let invitation = load_invitation(session, invitation_id).await?;

    let project = get_project(session, invitation.project_id).await?;
    require_owner(identity, &project)?;

    if invitation.status != InvitationStatus::Pending {
        return Err(DeskError::Conflict(format!(
            "Invitation is already {}",
            invitation.status.as_str()
        )));
    }

    let cancelled = session
        .store()
        .update_invitation_status(invitation_id, InvitationStatus::Declined, None)
        .await?;

    tracing::info!(invitation_id = %invitation_id, "Cancelled invitation");

    record_activity(
        session,
        identity,
        invitation.project_id,
        ActivityAction::InvitationCancelled,
        format!("Cancelled invitation for {}", invitation.email),
    )
    .await;

    Ok(cancelled)
}

/// Joins the project the invitation is for
pub async fn accept_invitation(session: &Session, invitation_id: Uuid) -> DeskResult<ProjectMember> {
    let identity = session.require_identity()?;
    let invitation = load_invitation(session, invitation_id).await?;
    require_invitee(identity, &invitation)?;

    let now = Utc::now();
    if invitation.status != InvitationStatus::Pending {
        return Err(DeskError::Conflict(format!(
            "Invitation is already {}",
            invitation.status.as_str()
        )));
    }
    if invitation.is_expired_at(now) {
        session
            .store()
            .update_invitation_status(invitation_id, InvitationStatus::Expired, None)
            .await?;
        return Err(DeskError::Conflict("Invitation has expired".to_string()));
    }

    let member = session
        .store()
        .insert_member(NewMember {
            project_id: invitation.project_id,
            user_id: identity.id,
            role: invitation.role,
        })
        .await?;

    session
        .store()
        .update_invitation_status(invitation_id, InvitationStatus::Accepted, Some(now))
        .await?;

    tracing::info!(invitation_id = %invitation_id, user_id = %identity.id, "Accepted invitation");

    record_activity(
        session,
        identity,
        invitation.project_id,
        ActivityAction::InvitationAccepted,
        format!("Joined as {}", invitation.role),
    )
    .await;

    Ok(member)
}
