/// Health check endpoint
///
/// Reports whether the server is running and whether the backend's change feed
/// connection is usable.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "backend": "platform",
///   "change_feed": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// `platform` or `memory`
    pub backend: String,

    /// Change feed status
    pub change_feed: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let change_feed = match state.backend.health_check().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if change_feed == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.name().to_string(),
        change_feed: change_feed.to_string(),
    }))
}
