/// Authentication endpoints
///
/// Sign-in is delegated to the backend's identity provider: the hosted platform in
/// production, local accounts when running in memory. Tokens come back exactly as the
/// provider issued them.
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Sign in with email and password
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new session
/// - `GET /v1/auth/authorize?provider=google` - OAuth redirect URL
/// - `POST /v1/auth/register` - Create a local account (memory backend only)
/// - `POST /v1/auth/logout` - Revoke the caller's refresh tokens

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use projectdesk_shared::auth::{middleware::AuthContext, AuthSession, Identity};
use projectdesk_shared::DeskError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked for strength by the account store
    pub password: String,

    /// Optional display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    /// OAuth provider, e.g. `google`
    pub provider: String,

    /// Where the provider sends the user back to
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub url: String,
}

/// Sign in with email and password
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "SecureP@ss123"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "v1.M...",
///   "token_type": "bearer",
///   "expires_in": 3600,
///   "user": { "id": "uuid", "email": "user@example.com", "full_name": null }
/// }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
/// - `502 Bad Gateway`: Identity provider unreachable
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthSession>> {
    req.validate().map_err(DeskError::from)?;

    let session = state
        .backend
        .identity_provider()
        .sign_in_with_password(&req.email, &req.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Sign-in failed");
            e
        })?;

    tracing::info!(user_id = %session.user.id, "Signed in");
    Ok(Json(session))
}

/// Exchanges a refresh token for a new session
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, used or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthSession>> {
    let session = state
        .backend
        .identity_provider()
        .refresh(&req.refresh_token)
        .await?;

    Ok(Json(session))
}

/// Returns the URL that starts an OAuth sign-in
///
/// # Errors
///
/// - `400 Bad Request`: The backend has no OAuth providers
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let url = state
        .backend
        .identity_provider()
        .authorize_url(&query.provider, query.redirect_to.as_deref())
        .map_err(|e| match e {
            DeskError::Config(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;

    Ok(Json(AuthorizeResponse { url }))
}

/// Creates a local account
///
/// Only mounted when the server runs on the memory backend; hosted accounts are
/// created through the platform.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed or password too weak
/// - `409 Conflict`: Email already registered
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Identity>)> {
    req.validate().map_err(DeskError::from)?;

    let accounts = state
        .backend
        .local_auth()
        .ok_or_else(|| ApiError::NotFound("Registration is not available".to_string()))?;

    let identity = accounts
        .register(&req.email, &req.password, req.full_name)
        .await?;

    Ok((StatusCode::CREATED, Json(identity)))
}

/// Signs the caller out
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state
        .backend
        .identity_provider()
        .sign_out(&auth.access_token)
        .await?;

    tracing::info!(user_id = %auth.identity.id, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}
