/// Access token issuing and validation
///
/// The hosted platform signs user access tokens with HS256 using the project's JWT
/// secret. The API verifies them locally with the same secret instead of calling the
/// identity provider on every request. The in-memory backend mints tokens of the same
/// shape with its own secret.
///
/// # Claims
///
/// - `sub`: user id
/// - `email`: account email, when known
/// - `aud`: always `"authenticated"` for signed-in users
/// - `role`: database role, `"authenticated"`
/// - `user_metadata.full_name`: display name chosen at sign-up, when set
/// - `iat` / `exp`: issue and expiry (Unix seconds)
///
/// # Example
///
/// ```
/// use projectdesk_shared::auth::jwt::{create_token, validate_token, AccessClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-development-secret-of-at-least-32-bytes";
/// let claims = AccessClaims::new(Uuid::new_v4(), Some("ada@example.com".to_string()), None);
///
/// let token = create_token(&claims, secret)?;
/// let validated = validate_token(&token, secret)?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DeskError;

/// Audience of tokens issued to signed-in users
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Lifetime of locally minted access tokens (seconds)
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was not issued for a signed-in user
    #[error("Invalid audience")]
    InvalidAudience,
}

impl From<JwtError> for DeskError {
    fn from(err: JwtError) -> Self {
        DeskError::Token(err.to_string())
    }
}

/// Free-form metadata the user supplied at sign-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject - user id
    pub sub: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    pub aud: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub user_metadata: UserMetadata,

    pub iat: i64,

    pub exp: i64,
}

impl AccessClaims {
    /// Claims for a signed-in user with the default lifetime
    pub fn new(user_id: Uuid, email: Option<String>, full_name: Option<String>) -> Self {
        Self::with_expiration(
            user_id,
            email,
            full_name,
            Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
        )
    }

    pub fn with_expiration(
        user_id: Uuid,
        email: Option<String>,
        full_name: Option<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email,
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            role: AUTHENTICATED_AUDIENCE.to_string(),
            user_metadata: UserMetadata { full_name },
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &AccessClaims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry and audience, and returns the claims
pub fn validate_token(token: &str, secret: &str) -> Result<AccessClaims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<AccessClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience,
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        }
    })?;

    Ok(token_data.claims)
}

/// Extracts the token from an `Authorization: Bearer ...` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
