//! Backend and per-user sessions
//!
//! A [`Backend`] is built once at startup and owns the long-lived resources: the HTTP
//! client or the in-memory tables, the identity provider and the change feed.
//! [`Backend::open_session`] binds those to one identity and its access token; the
//! resulting [`Session`] is what workflows and the notification reconciler run against.
//! Nothing here is process-global.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::auth::local::LocalAuth;
use crate::auth::provider::IdentityProvider;
use crate::blob::{BlobStorage, MemoryBlobStorage, DEFAULT_BUCKET};
use crate::config::PlatformConfig;
use crate::db::migrations::run_migrations;
use crate::db::pool::{create_pool, health_check, DatabaseConfig};
use crate::error::{DeskError, DeskResult};
use crate::feed::{ChangeFeed, PgChangeFeed};
use crate::notifications::NotificationReconciler;
use crate::platform::{PlatformAuth, PlatformClient, PlatformStorage, PlatformStore};
use crate::store::{DataStore, MemoryStore};

#[derive(Clone)]
enum BackendKind {
    Platform {
        client: PlatformClient,
        auth: PlatformAuth,
        feed: PgChangeFeed,
    },
    Memory {
        store: MemoryStore,
        blobs: MemoryBlobStorage,
        auth: LocalAuth,
    },
}

/// Long-lived backend handles; clones share them
#[derive(Clone)]
pub struct Backend {
    kind: BackendKind,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("kind", &self.name()).finish()
    }
}

impl Backend {
    /// Hosted platform with an already connected change feed
    pub fn platform(config: PlatformConfig, feed: PgChangeFeed) -> DeskResult<Self> {
        let client = PlatformClient::new(config)?;
        Ok(Self {
            kind: BackendKind::Platform {
                auth: PlatformAuth::new(client.clone()),
                client,
                feed,
            },
        })
    }

    /// Connects the change feed pool, installs the notify trigger and builds the backend
    pub async fn connect_platform(config: PlatformConfig, database: DatabaseConfig) -> DeskResult<Self> {
        let pool = create_pool(database).await?;
        run_migrations(&pool)
            .await
            .map_err(|e| DeskError::Feed(format!("Failed to install change trigger: {}", e)))?;

        tracing::info!(url = %config.url, "Connected to hosted platform");
        let feed = PgChangeFeed::start(pool).await?;
        Self::platform(config, feed)
    }

    /// In-process backend; `base_url` prefixes public file URLs
    pub fn memory(jwt_secret: impl Into<String>, base_url: impl Into<String>) -> Self {
        let store = MemoryStore::new();
        Self {
            kind: BackendKind::Memory {
                auth: LocalAuth::new(jwt_secret, store.clone()),
                blobs: MemoryBlobStorage::new(base_url, DEFAULT_BUCKET),
                store,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            BackendKind::Platform { .. } => "platform",
            BackendKind::Memory { .. } => "memory",
        }
    }

    pub fn identity_provider(&self) -> &dyn IdentityProvider {
        match &self.kind {
            BackendKind::Platform { auth, .. } => auth as &dyn IdentityProvider,
            BackendKind::Memory { auth, .. } => auth as &dyn IdentityProvider,
        }
    }

    /// Shared change feed
    pub fn feed(&self) -> Arc<dyn ChangeFeed> {
        match &self.kind {
            BackendKind::Platform { feed, .. } => Arc::new(feed.clone()) as Arc<dyn ChangeFeed>,
            BackendKind::Memory { store, .. } => Arc::new(store.feed()) as Arc<dyn ChangeFeed>,
        }
    }

    /// Local accounts, when running in memory
    pub fn local_auth(&self) -> Option<&LocalAuth> {
        match &self.kind {
            BackendKind::Memory { auth, .. } => Some(auth),
            BackendKind::Platform { .. } => None,
        }
    }

    /// In-process tables, when running in memory
    pub fn memory_store(&self) -> Option<&MemoryStore> {
        match &self.kind {
            BackendKind::Memory { store, .. } => Some(store),
            BackendKind::Platform { .. } => None,
        }
    }

    /// Binds the backend to an identity and its access token
    pub fn open_session(&self, identity: Identity, access_token: &str) -> Session {
        let (store, blobs): (Arc<dyn DataStore>, Arc<dyn BlobStorage>) = match &self.kind {
            BackendKind::Platform { client, .. } => (
                Arc::new(PlatformStore::new(client.clone(), access_token)),
                Arc::new(PlatformStorage::new(client.clone(), access_token)),
            ),
            BackendKind::Memory { store, blobs, .. } => {
                let store: Arc<dyn DataStore> = Arc::new(store.clone());
                let blobs: Arc<dyn BlobStorage> = Arc::new(blobs.clone());
                (store, blobs)
            }
        };

        tracing::debug!(user_id = %identity.id, backend = self.name(), "Opened session");
        Session::new(Some(identity), store, blobs, self.feed())
    }

    pub async fn health_check(&self) -> DeskResult<()> {
        match &self.kind {
            BackendKind::Platform { feed, .. } => Ok(health_check(feed.pool()).await?),
            BackendKind::Memory { .. } => Ok(()),
        }
    }

    /// Releases the feed's connections
    pub async fn shutdown(&self) {
        self.feed().shutdown().await;
        tracing::info!(backend = self.name(), "Backend shut down");
    }
}

/// One identity's view of the backend
#[derive(Clone)]
pub struct Session {
    identity: Option<Identity>,
    store: Arc<dyn DataStore>,
    blobs: Arc<dyn BlobStorage>,
    feed: Arc<dyn ChangeFeed>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        identity: Option<Identity>,
        store: Arc<dyn DataStore>,
        blobs: Arc<dyn BlobStorage>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            identity,
            store,
            blobs,
            feed,
        }
    }

    /// Session over the given collaborators with nobody signed in
    pub fn anonymous(
        store: Arc<dyn DataStore>,
        blobs: Arc<dyn BlobStorage>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self::new(None, store, blobs, feed)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The signed-in identity, or [`DeskError::AuthRequired`]
    pub fn require_identity(&self) -> DeskResult<&Identity> {
        self.identity.as_ref().ok_or(DeskError::AuthRequired)
    }

    pub fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    pub fn blobs(&self) -> &dyn BlobStorage {
        self.blobs.as_ref()
    }

    pub fn feed(&self) -> &dyn ChangeFeed {
        self.feed.as_ref()
    }

    /// Unread-comment reconciler for the signed-in identity
    pub fn notifications(&self, project_id: Option<Uuid>) -> DeskResult<NotificationReconciler> {
        let identity = self.require_identity()?;
        Ok(NotificationReconciler::new(
            self.store.clone(),
            identity.id,
            project_id,
        ))
    }
}
