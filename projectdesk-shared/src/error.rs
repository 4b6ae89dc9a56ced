//! Common error type for the shared library
//!
//! Every workflow, store and feed operation returns [`DeskResult`]. The variants follow
//! the three failure classes the application distinguishes:
//!
//! 1. **Authentication required** - an operation needs an identity and there is none.
//!    This is a hard stop for that action.
//! 2. **Network/store errors** - the hosted platform or the change feed failed. These are
//!    reported to the caller and never retried automatically.
//! 3. **Validation errors** - caught before any network write happens.

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// Result alias used across the crate
pub type DeskResult<T> = Result<T, DeskError>;

/// A single rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error type shared by the data store, change feed, identity provider and workflows
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// No authenticated identity for an operation that needs one
    #[error("Authentication required")]
    AuthRequired,

    /// Input rejected before submission
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Referenced record does not exist (or is hidden by row-level security)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identity is known but not allowed to perform the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Write conflicts with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Hosted platform answered with an error status
    #[error("Platform error ({status}): {message}")]
    Platform { status: u16, message: String },

    /// Request never reached the platform or the response was unreadable
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Change feed could not be established or broke
    #[error("Change feed error: {0}")]
    Feed(String),

    /// Error from the change feed's Postgres connection
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Token could not be issued or verified
    #[error("Invalid token: {0}")]
    Token(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DeskError::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether the error came from the network or the store rather than the caller
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            DeskError::Platform { .. }
                | DeskError::Transport(_)
                | DeskError::Feed(_)
                | DeskError::Database(_)
                | DeskError::Serialization(_)
        )
    }
}

impl From<ValidationErrors> for DeskError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();

        // HashMap iteration order is not stable
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        DeskError::Validation(fields)
    }
}
