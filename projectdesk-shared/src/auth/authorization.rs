/// Project-level authorization checks
///
/// Row-level security on the hosted platform decides what a user may read. These
/// checks cover the actions the application itself restricts: managing invitations is
/// reserved for the project owner, and an invitation can only be accepted by the
/// address it was sent to.

use uuid::Uuid;

use super::identity::Identity;
use crate::error::DeskError;
use crate::models::invitation::ProjectInvitation;
use crate::models::project::Project;

/// Authorization errors
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Only the project owner may do this
    #[error("Only the owner of project {0} can do this")]
    NotOwner(Uuid),

    /// Invitation was addressed to someone else
    #[error("This invitation was sent to a different email address")]
    NotInvitee,
}

impl From<AuthzError> for DeskError {
    fn from(err: AuthzError) -> Self {
        DeskError::Forbidden(err.to_string())
    }
}

/// Ensures the identity owns the project
pub fn require_owner(identity: &Identity, project: &Project) -> Result<(), AuthzError> {
    if !project.is_owned_by(identity.id) {
        return Err(AuthzError::NotOwner(project.id));
    }

    Ok(())
}

/// Ensures the invitation was sent to the identity's email
pub fn require_invitee(identity: &Identity, invitation: &ProjectInvitation) -> Result<(), AuthzError> {
    match identity.email.as_deref() {
        Some(email) if invitation.is_for(email) => Ok(()),
        _ => Err(AuthzError::NotInvitee),
    }
}
