/// Project membership model
///
/// Links an identity to a project with a role. The creator of a project is inserted as
/// its owner; everybody else joins by accepting an invitation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES auth.users(id) ON DELETE CASCADE,
///     role TEXT NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ DEFAULT NOW(),
///     UNIQUE (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::profile::Profile;

/// Role within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MemberRole::Owner => "Owner",
            MemberRole::Admin => "Admin",
            MemberRole::Member => "Member",
        }
    }

    /// Whether an invitation may grant this role
    pub fn is_invitable(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Member)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(MemberRole::Owner),
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Membership row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `project_members` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
}

/// Membership joined with the member's profile, as shown on the members list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberWithProfile {
    #[serde(flatten)]
    pub member: ProjectMember,

    pub profile: Option<Profile>,
}

impl MemberWithProfile {
    pub fn email(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.email.as_str())
    }

    /// Profile name, then email, then "Unknown User"
    pub fn display_name(&self) -> &str {
        match &self.profile {
            Some(profile) => profile.display_name(),
            None => "Unknown User",
        }
    }
}
