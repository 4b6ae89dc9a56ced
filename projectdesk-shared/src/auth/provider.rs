//! Identity provider seam
//!
//! Sign-in, token refresh and sign-out are delegated to whichever provider the backend
//! was built with: the hosted platform's auth endpoints or the local in-memory
//! accounts.

use async_trait::async_trait;

use super::identity::{AuthSession, Identity};
use crate::error::DeskResult;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Email + password sign-in
    async fn sign_in_with_password(&self, email: &str, password: &str) -> DeskResult<AuthSession>;

    /// Exchanges a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> DeskResult<AuthSession>;

    /// Resolves the identity behind an access token
    async fn current_user(&self, access_token: &str) -> DeskResult<Identity>;

    /// Revokes the session behind an access token
    async fn sign_out(&self, access_token: &str) -> DeskResult<()>;

    /// URL that starts interactive OAuth sign-in with `provider`
    fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> DeskResult<String>;
}
