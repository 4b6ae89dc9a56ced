/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::connect(config).await?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::{BackendConfig, Config}, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use projectdesk_shared::auth::middleware::{jwt_auth_middleware, AuthContext, AuthError};
use projectdesk_shared::{Backend, DeskResult, Session};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body, sized for task attachments
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// The backend and configuration are shared, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Long-lived backend handles
    pub backend: Backend,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(backend: Backend, config: Config) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }

    /// Builds the configured backend and wraps it in state
    pub async fn connect(config: Config) -> DeskResult<Self> {
        let backend = match &config.backend {
            BackendConfig::Platform { platform, database } => {
                Backend::connect_platform(platform.clone(), database.clone()).await?
            }
            BackendConfig::Memory {
                jwt_secret,
                public_url,
            } => Backend::memory(jwt_secret.clone(), public_url.clone()),
        };

        Ok(Self::new(backend, config))
    }

    /// Secret bearer tokens are verified with
    pub fn token_secret(&self) -> &str {
        self.config.backend.token_secret()
    }

    /// Opens a session for the authenticated caller
    pub fn session(&self, auth: &AuthContext) -> Session {
        self.backend
            .open_session(auth.identity.clone(), &auth.access_token)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/                           # Public, except logout
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   ├── GET  /authorize
///     │   ├── POST /register               # memory backend only
///     │   └── POST /logout
///     ├── GET   /me, PATCH /me/profile
///     ├── GET   /dashboard
///     ├── GET|POST /projects
///     ├── GET   /projects/:id
///     ├── PATCH /projects/:id/status
///     ├── GET|POST /projects/:id/tasks     # POST is multipart
///     ├── PATCH /tasks/:id/status
///     ├── GET|POST /projects/:id/comments
///     ├── GET|POST /tasks/:id/comments
///     ├── GET   /projects/:id/activity, /activity
///     ├── GET   /projects/:id/members
///     ├── GET|POST /projects/:id/invitations
///     ├── POST  /invitations/:id/cancel, /invitations/:id/accept
///     ├── GET   /notifications/unread
///     ├── GET   /notifications/stream      # SSE
///     └── POST  /comments/:id/read
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let mut auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/authorize", get(routes::auth::authorize))
        .route(
            "/logout",
            post(routes::auth::logout).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_layer,
            )),
        );

    if state.backend.local_auth().is_some() {
        auth_routes = auth_routes.route("/register", post(routes::auth::register));
    }

    // Everything below requires a bearer token
    let protected_routes = Router::new()
        .route("/me", get(routes::settings::get_settings))
        .route("/me/profile", patch(routes::settings::update_profile))
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route(
            "/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route("/projects/:id", get(routes::projects::get_project))
        .route(
            "/projects/:id/status",
            patch(routes::projects::update_project_status),
        )
        .route(
            "/projects/:id/tasks",
            get(routes::tasks::list_tasks)
                .post(routes::tasks::create_task)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/tasks/:id/status", patch(routes::tasks::update_task_status))
        .route(
            "/projects/:id/comments",
            get(routes::comments::list_project_comments).post(routes::comments::add_project_comment),
        )
        .route(
            "/tasks/:id/comments",
            get(routes::comments::list_task_comments).post(routes::comments::add_task_comment),
        )
        .route("/projects/:id/activity", get(routes::activity::project_activity))
        .route("/activity", get(routes::activity::list_activity))
        .route("/projects/:id/members", get(routes::members::list_members))
        .route(
            "/projects/:id/invitations",
            get(routes::members::list_invitations).post(routes::members::invite_member),
        )
        .route(
            "/invitations/:id/cancel",
            post(routes::members::cancel_invitation),
        )
        .route(
            "/invitations/:id/accept",
            post(routes::members::accept_invitation),
        )
        .route(
            "/notifications/unread",
            get(routes::notifications::unread_count),
        )
        .route(
            "/notifications/stream",
            get(routes::notifications::stream_unread),
        )
        .route("/comments/:id/read", post(routes::notifications::mark_as_read))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token authentication layer
///
/// Verifies the access token with the backend's secret and injects an
/// [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(state.token_secret().to_string(), req, next).await
}
