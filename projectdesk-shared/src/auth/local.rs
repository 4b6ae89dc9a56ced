//! Local accounts for the in-memory backend
//!
//! Stands in for the platform's auth API during development and tests. Passwords are
//! hashed with Argon2id, access tokens are HS256 JWTs with the same claims the platform
//! issues, so the bearer middleware cannot tell the two apart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::identity::{AuthSession, Identity};
use super::jwt::{create_token, validate_token, AccessClaims};
use super::password::{hash_password, validate_password_strength, verify_password};
use super::provider::IdentityProvider;
use crate::error::{DeskError, DeskResult};
use crate::models::Profile;
use crate::store::MemoryStore;

/// How long an unused refresh token stays valid
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password_hash: String,
}

#[derive(Debug, Clone, Copy)]
struct RefreshGrant {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Accounts {
    /// Keyed by lowercased email
    by_email: HashMap<String, Account>,
    refresh_tokens: HashMap<String, RefreshGrant>,
}

impl Accounts {
    fn prune_expired_tokens(&mut self, now: DateTime<Utc>) {
        self.refresh_tokens.retain(|_, grant| grant.expires_at > now);
    }
}

/// [`IdentityProvider`] over accounts held in process
#[derive(Debug, Clone)]
pub struct LocalAuth {
    secret: String,
    store: MemoryStore,
    refresh_ttl: Duration,
    accounts: Arc<RwLock<Accounts>>,
}

impl LocalAuth {
    pub fn new(secret: impl Into<String>, store: MemoryStore) -> Self {
        Self {
            secret: secret.into(),
            store,
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
            accounts: Arc::new(RwLock::new(Accounts::default())),
        }
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Creates an account and its profile row
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<String>,
    ) -> DeskResult<Identity> {
        validate_password_strength(password).map_err(|message| DeskError::invalid("password", message))?;

        let key = email.trim().to_lowercase();
        if key.is_empty() {
            return Err(DeskError::invalid("email", "Email is required"));
        }

        // hashing is slow; keep it outside the lock
        let password_hash = hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.by_email.contains_key(&key) {
            return Err(DeskError::Conflict("User already registered".to_string()));
        }

        let identity = Identity::new(Uuid::new_v4(), Some(key.clone()), full_name.clone());
        accounts.by_email.insert(
            key.clone(),
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        drop(accounts);

        let now = Utc::now();
        self.store
            .put_profile(Profile {
                id: identity.id,
                email: key,
                full_name,
                avatar_url: None,
                created_at: Some(now),
                updated_at: Some(now),
            })
            .await;

        tracing::info!(user_id = %identity.id, "Registered local account");
        Ok(identity)
    }

    /// Mints an access token for `identity` without a password check
    pub fn issue_access_token(&self, identity: &Identity) -> DeskResult<String> {
        let claims = AccessClaims::new(identity.id, identity.email.clone(), identity.full_name.clone());
        Ok(create_token(&claims, &self.secret)?)
    }

    async fn new_session(&self, identity: Identity) -> DeskResult<AuthSession> {
        let claims = AccessClaims::new(identity.id, identity.email.clone(), identity.full_name.clone());
        let access_token = create_token(&claims, &self.secret)?;
        let refresh_token = Uuid::new_v4().simple().to_string();

        let now = Utc::now();
        let mut accounts = self.accounts.write().await;
        accounts.prune_expired_tokens(now);
        accounts.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                user_id: identity.id,
                expires_at: now + self.refresh_ttl,
            },
        );
        drop(accounts);

        Ok(AuthSession {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: claims.expires_in(),
            user: identity,
        })
    }

    async fn find_by_id(&self, user_id: Uuid) -> Option<Identity> {
        self.accounts
            .read()
            .await
            .by_email
            .values()
            .find(|account| account.identity.id == user_id)
            .map(|account| account.identity.clone())
    }
}

fn invalid_credentials() -> DeskError {
    DeskError::Platform {
        status: 400,
        message: "Invalid login credentials".to_string(),
    }
}

#[async_trait]
impl IdentityProvider for LocalAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> DeskResult<AuthSession> {
        let account = self
            .accounts
            .read()
            .await
            .by_email
            .get(&email.trim().to_lowercase())
            .cloned()
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &account.password_hash)? {
            tracing::warn!(user_id = %account.identity.id, "Rejected local sign-in");
            return Err(invalid_credentials());
        }

        self.new_session(account.identity).await
    }

    async fn refresh(&self, refresh_token: &str) -> DeskResult<AuthSession> {
        // refresh tokens are single use
        let grant = self
            .accounts
            .write()
            .await
            .refresh_tokens
            .remove(refresh_token)
            .filter(|grant| grant.expires_at > Utc::now())
            .ok_or_else(|| DeskError::Token("Invalid refresh token".to_string()))?;
        let user_id = grant.user_id;

        let identity = self
            .find_by_id(user_id)
            .await
            .ok_or_else(|| DeskError::NotFound("User not found".to_string()))?;
        self.new_session(identity).await
    }

    async fn current_user(&self, access_token: &str) -> DeskResult<Identity> {
        let claims = validate_token(access_token, &self.secret)?;
        Ok(Identity::from(&claims))
    }

    async fn sign_out(&self, access_token: &str) -> DeskResult<()> {
        let claims = validate_token(access_token, &self.secret)?;
        self.accounts
            .write()
            .await
            .refresh_tokens
            .retain(|_, grant| grant.user_id != claims.sub);
        Ok(())
    }

    fn authorize_url(&self, provider: &str, _redirect_to: Option<&str>) -> DeskResult<String> {
        Err(DeskError::Config(format!(
            "OAuth sign-in with {} is not available for local accounts",
            provider
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DataStore;

    const SECRET: &str = "local-development-secret-32-bytes!!";

    #[tokio::test]
    async fn test_register_and_sign_in() {
        let store = MemoryStore::new();
        let auth = LocalAuth::new(SECRET, store.clone());

        let identity = auth
            .register("Ada@Example.com", "analytical", Some("Ada Lovelace".to_string()))
            .await
            .unwrap();
        let profile = store.get_profile(identity.id).await.unwrap().unwrap();
        assert_eq!(profile.email, "ada@example.com");

        let session = auth
            .sign_in_with_password("ada@example.com", "analytical")
            .await
            .unwrap();
        assert_eq!(session.user.id, identity.id);

        let current = auth.current_user(&session.access_token).await.unwrap();
        assert_eq!(current.display_name(), "Ada Lovelace");

        assert!(auth.sign_in_with_password("ada@example.com", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_registration() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new());
        auth.register("grace@example.com", "cobol-rules", None).await.unwrap();

        assert!(matches!(
            auth.register("grace@example.com", "another-one", None).await,
            Err(DeskError::Conflict(_))
        ));
        assert!(matches!(
            auth.register("linus@example.com", "123", None).await,
            Err(DeskError::Validation(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_registrations_admit_one() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new());

        let (first, second) = tokio::join!(
            auth.register("ada@example.com", "analytical", None),
            auth.register("ADA@example.com", "difference-engine", None),
        );

        let conflicts = [&first, &second]
            .iter()
            .filter(|result| matches!(result, Err(DeskError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert!(first.is_ok() || second.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_is_single_use_and_sign_out_revokes() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new());
        auth.register("ada@example.com", "analytical", None).await.unwrap();
        let session = auth
            .sign_in_with_password("ada@example.com", "analytical")
            .await
            .unwrap();

        let refreshed = auth.refresh(&session.refresh_token).await.unwrap();
        assert!(auth.refresh(&session.refresh_token).await.is_err());

        auth.sign_out(&refreshed.access_token).await.unwrap();
        assert!(auth.refresh(&refreshed.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_refresh_tokens_are_rejected_and_pruned() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new()).with_refresh_ttl(Duration::zero());
        auth.register("ada@example.com", "analytical", None).await.unwrap();

        let first = auth
            .sign_in_with_password("ada@example.com", "analytical")
            .await
            .unwrap();
        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(DeskError::Token(_))
        ));

        // each new session sweeps the expired ones
        for _ in 0..3 {
            auth.sign_in_with_password("ada@example.com", "analytical")
                .await
                .unwrap();
        }
        assert_eq!(auth.accounts.read().await.refresh_tokens.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_tokens_live_until_ttl() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new());
        auth.register("ada@example.com", "analytical", None).await.unwrap();
        auth.sign_in_with_password("ada@example.com", "analytical")
            .await
            .unwrap();

        let accounts = auth.accounts.read().await;
        let grant = accounts.refresh_tokens.values().next().unwrap();
        let ttl = grant.expires_at - Utc::now();
        assert!(ttl > Duration::days(REFRESH_TOKEN_TTL_DAYS - 1));
        assert!(ttl <= Duration::days(REFRESH_TOKEN_TTL_DAYS));
    }

    #[test]
    fn test_no_oauth_for_local_accounts() {
        let auth = LocalAuth::new(SECRET, MemoryStore::new());
        assert!(matches!(auth.authorize_url("google", None), Err(DeskError::Config(_))));
    }
}
