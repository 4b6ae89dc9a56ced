/// Bearer-token authentication middleware for Axum
///
/// Verifies the `Authorization: Bearer <access token>` header against the JWT secret
/// and stores an [`AuthContext`] in the request extensions for handlers to pick up.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Router};
/// use projectdesk_shared::auth::middleware::jwt_auth_middleware;
///
/// let secret = "a-development-secret-of-at-least-32-bytes".to_string();
/// let app: Router = Router::new()
///     .route("/protected", get(|| async { "ok" }))
///     .layer(middleware::from_fn(move |req: Request, next: Next| {
///         jwt_auth_middleware(secret.clone(), req, next)
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::identity::Identity;
use super::jwt::{extract_bearer_token, validate_token, JwtError};

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,

    /// Raw access token, forwarded to the platform so row-level security applies
    pub access_token: String,
}

/// Authentication failures
#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,

    InvalidFormat(String),

    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(json!({
            "error": "unauthorized",
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Verifies the bearer token and attaches the caller's [`AuthContext`]
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = extract_bearer_token(auth_header)
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?
        .to_string();

    let claims = validate_token(&token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidAudience => AuthError::InvalidToken("Invalid audience".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    tracing::debug!(user_id = %claims.sub, "Authenticated request");

    req.extensions_mut().insert(AuthContext {
        identity: Identity::from(&claims),
        access_token: token,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, AccessClaims};
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "middleware-test-secret-at-least-32-bytes";

    fn app() -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(auth): Extension<AuthContext>| async move {
                    auth.identity.display_name()
                }),
            )
            .layer(middleware::from_fn(|req: Request, next: Next| {
                jwt_auth_middleware(SECRET.to_string(), req, next)
            }))
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_bad_request() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let claims = AccessClaims::new(Uuid::new_v4(), None, Some("Ada".to_string()));
        let token = create_token(&claims, SECRET).unwrap();

        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
