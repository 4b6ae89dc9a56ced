/// Project invitation model
///
/// Owners invite collaborators by email. At most one pending invitation may exist per
/// (project, email). Cancelling an invitation marks it declined; accepting it creates
/// the membership.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     email TEXT NOT NULL,
///     role TEXT NOT NULL DEFAULT 'member',
///     status TEXT NOT NULL DEFAULT 'pending',
///     invited_by UUID NOT NULL REFERENCES auth.users(id),
///     invited_at TIMESTAMPTZ DEFAULT NOW(),
///     expires_at TIMESTAMPTZ DEFAULT NOW() + INTERVAL '7 days',
///     accepted_at TIMESTAMPTZ
/// );
///
/// CREATE UNIQUE INDEX idx_invitations_pending
///     ON project_invitations(project_id, email) WHERE status = 'pending';
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::member::MemberRole;

/// Days an invitation stays valid
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Invitation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "Pending",
            InvitationStatus::Accepted => "Accepted",
            InvitationStatus::Declined => "Declined",
            InvitationStatus::Expired => "Expired",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invitation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInvitation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub status: InvitationStatus,
    pub invited_by: Uuid,
    #[serde(default)]
    pub invited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl ProjectInvitation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    /// Pending and not past its expiry
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired_at(now)
    }

    /// Case-insensitive email comparison
    pub fn is_for(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Insert payload for the `project_invitations` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvitation {
    pub project_id: Uuid,
    pub email: String,
    pub role: MemberRole,
    pub invited_by: Uuid,
}

impl NewInvitation {
    /// Default expiry for an invitation sent at `invited_at`
    pub fn expiry_from(invited_at: DateTime<Utc>) -> DateTime<Utc> {
        invited_at + Duration::days(INVITATION_TTL_DAYS)
    }
}

/// "Invite member" form input
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvitationForm {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    pub role: MemberRole,
}
