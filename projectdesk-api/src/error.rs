/// Error handling for the API server
///
/// All handlers return `Result<T, ApiError>`, which converts to an HTTP response
/// with a JSON body:
///
/// ```json
/// { "error": "validation_error", "message": "Request validation failed", "details": [...] }
/// ```
///
/// Workflow errors ([`DeskError`]) map as follows:
///
/// | DeskError                               | Status |
/// |-----------------------------------------|--------|
/// | `AuthRequired`, `Token`                 | 401    |
/// | `Validation`                            | 422    |
/// | `Forbidden`                             | 403    |
/// | `NotFound`                              | 404    |
/// | `Conflict`                              | 409    |
/// | `Platform`, `Transport`, `Feed`, `Database` | 502 |
/// | anything else                           | 500    |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use projectdesk_shared::error::{DeskError, FieldError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate invitation
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<FieldError>),

    /// Bad gateway (502) - the hosted platform or the change feed failed
    Upstream(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Rejected fields, for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "upstream_error", msg, None)
            }
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert workflow errors to API errors
impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        match err {
            DeskError::AuthRequired => ApiError::Unauthorized("Authentication required".to_string()),
            DeskError::Token(msg) => ApiError::Unauthorized(msg),
            DeskError::Validation(fields) => ApiError::ValidationError(fields),
            DeskError::NotFound(msg) => ApiError::NotFound(msg),
            DeskError::Forbidden(msg) => ApiError::Forbidden(msg),
            DeskError::Conflict(msg) => ApiError::Conflict(msg),
            // the identity provider rejects bad credentials with a 400
            DeskError::Platform { status: 400, message } => ApiError::Unauthorized(message),
            DeskError::Platform { status: 401, message } => ApiError::Unauthorized(message),
            err if err.is_store_failure() => ApiError::Upstream(err.to_string()),
            err => ApiError::InternalError(err.to_string()),
        }
    }
}
