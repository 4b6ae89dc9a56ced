/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: access token claims, issuing and validation (HS256)
/// - [`identity`]: the signed-in user and sign-in sessions
/// - [`provider`]: the identity provider seam (hosted platform or local accounts)
/// - [`password`]: Argon2id hashing for local accounts
/// - [`local`]: in-process accounts for the memory backend
/// - [`authorization`]: owner and invitee checks
/// - [`middleware`]: bearer-token middleware for Axum
///
/// # Example
///
/// ```no_run
/// use projectdesk_shared::auth::identity::Identity;
/// use projectdesk_shared::auth::jwt::{create_token, validate_token, AccessClaims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-development-secret-of-at-least-32-bytes";
/// let token = create_token(&AccessClaims::new(Uuid::new_v4(), None, None), secret)?;
///
/// let identity = Identity::from(&validate_token(&token, secret)?);
/// assert_eq!(identity.display_name(), "Unknown User");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod local;
pub mod middleware;
pub mod password;
pub mod provider;

pub use identity::{AuthSession, Identity};
pub use local::LocalAuth;
pub use provider::IdentityProvider;
