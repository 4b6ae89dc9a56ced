//! Hosted platform client
//!
//! The platform exposes three HTTP APIs under one base URL:
//!
//! - `/rest/v1/{table}`: table reads and writes ([`rest::PlatformStore`])
//! - `/storage/v1/object/{bucket}/{path}`: file uploads ([`storage::PlatformStorage`])
//! - `/auth/v1/*`: sign-in, refresh and sign-out ([`auth::PlatformAuth`])
//!
//! Every request carries the anon key as `apikey` and a bearer token: the user's access
//! token when one is bound, otherwise the anon key. Row-level security on the platform
//! decides what a token may read or write.

pub mod auth;
pub mod rest;
pub mod storage;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::PlatformConfig;
use crate::error::{DeskError, DeskResult};

pub use auth::PlatformAuth;
pub use rest::PlatformStore;
pub use storage::PlatformStorage;

/// Shared HTTP client for one platform project; clones share the connection pool
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    config: Arc<PlatformConfig>,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> DeskResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Request with the `apikey` header and a bearer token
    pub fn request(&self, method: Method, url: &str, access_token: Option<&str>) -> RequestBuilder {
        let token = access_token.unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }
}

/// Error body shapes returned by the platform APIs
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Maps a non-success status and body to a [`DeskError`]
pub fn error_from_status(status: StatusCode, body: &str) -> DeskError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    match status {
        StatusCode::CONFLICT => DeskError::Conflict(message),
        StatusCode::NOT_FOUND => DeskError::NotFound(message),
        StatusCode::FORBIDDEN => DeskError::Forbidden(message),
        _ => DeskError::Platform {
            status: status.as_u16(),
            message,
        },
    }
}

/// Passes a success response through, turns anything else into an error
pub async fn check(response: Response) -> DeskResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let err = error_from_status(status, &body);
    tracing::warn!(status = status.as_u16(), path = %url, error = %err, "Platform request failed");
    Err(err)
}
