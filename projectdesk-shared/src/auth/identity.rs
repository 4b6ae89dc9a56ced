//! Authenticated identity and sign-in sessions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::AccessClaims;

/// Fallback shown when an identity has neither a name nor an email
pub const UNKNOWN_USER: &str = "Unknown User";

/// The signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, email: Option<String>, full_name: Option<String>) -> Self {
        Self {
            id,
            email,
            full_name,
        }
    }

    /// Name stamped on rows this identity writes: full name, else email, else
    /// "Unknown User"
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or(UNKNOWN_USER)
            .to_string()
    }
}

impl From<&AccessClaims> for Identity {
    fn from(claims: &AccessClaims) -> Self {
        Identity {
            id: claims.sub,
            email: claims.email.clone(),
            full_name: claims.user_metadata.full_name.clone(),
        }
    }
}

/// Tokens returned by a successful sign-in or refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,

    pub refresh_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Seconds until the access token expires
    pub expires_in: i64,

    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let identity = Identity::new(
            Uuid::new_v4(),
            Some("ada@example.com".to_string()),
            Some("Ada Lovelace".to_string()),
        );
        assert_eq!(identity.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let identity = Identity::new(
            Uuid::new_v4(),
            Some("ada@example.com".to_string()),
            Some("  ".to_string()),
        );
        assert_eq!(identity.display_name(), "ada@example.com");
    }

    #[test]
    fn test_display_name_unknown() {
        let identity = Identity::new(Uuid::new_v4(), None, None);
        assert_eq!(identity.display_name(), UNKNOWN_USER);
    }

    #[test]
    fn test_from_claims() {
        let claims = AccessClaims::new(
            Uuid::new_v4(),
            Some("grace@example.com".to_string()),
            Some("Grace".to_string()),
        );
        let identity = Identity::from(&claims);
        assert_eq!(identity.id, claims.sub);
        assert_eq!(identity.display_name(), "Grace");
    }
}
