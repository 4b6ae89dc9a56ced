//! Sign-in against the platform's auth API

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{check, PlatformClient};
use crate::auth::identity::{AuthSession, Identity};
use crate::auth::jwt::UserMetadata;
use crate::auth::provider::IdentityProvider;
use crate::error::{DeskError, DeskResult};

/// User object returned by `/auth/v1/user` and embedded in token responses
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformUser {
    pub id: Uuid,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl From<PlatformUser> for Identity {
    fn from(user: PlatformUser) -> Self {
        Identity::new(user.id, user.email, user.user_metadata.full_name)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
    user: PlatformUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(response: TokenResponse) -> Self {
        AuthSession {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in: response.expires_in,
            user: response.user.into(),
        }
    }
}

/// [`IdentityProvider`] backed by the platform
#[derive(Debug, Clone)]
pub struct PlatformAuth {
    client: PlatformClient,
}

impl PlatformAuth {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.client.config().auth_url(), path)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> DeskResult<AuthSession> {
        let response = self
            .client
            .request(Method::POST, &self.url("token"), None)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        let response: TokenResponse = check(response).await?.json().await?;
        Ok(response.into())
    }
}

#[async_trait]
impl IdentityProvider for PlatformAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> DeskResult<AuthSession> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn refresh(&self, refresh_token: &str) -> DeskResult<AuthSession> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn current_user(&self, access_token: &str) -> DeskResult<Identity> {
        let response = self
            .client
            .request(Method::GET, &self.url("user"), Some(access_token))
            .send()
            .await?;

        let user: PlatformUser = check(response).await?.json().await?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> DeskResult<()> {
        let response = self
            .client
            .request(Method::POST, &self.url("logout"), Some(access_token))
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    fn authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> DeskResult<String> {
        let mut params = vec![("provider", provider)];
        if let Some(redirect) = redirect_to {
            params.push(("redirect_to", redirect));
        }

        reqwest::Url::parse_with_params(&self.url("authorize"), &params)
            .map(String::from)
            .map_err(|e| DeskError::Config(format!("invalid authorize URL: {}", e)))
    }
}
