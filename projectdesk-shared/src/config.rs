/// Hosted platform configuration
///
/// # Environment Variables
///
/// - `PLATFORM_URL`: base URL of the platform project (required)
/// - `PLATFORM_ANON_KEY`: public API key sent as `apikey` on every request (required)
/// - `PLATFORM_JWT_SECRET`: secret the platform signs access tokens with, at least
///   32 characters (required)
/// - `PLATFORM_STORAGE_BUCKET`: bucket for task attachments (default: project-files)
/// - `PLATFORM_TIMEOUT_SECS`: HTTP request timeout (default: 30)

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::blob::DEFAULT_BUCKET;
use crate::error::{DeskError, DeskResult};

/// Minimum accepted length of the token secret
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL, without trailing slash
    pub url: String,

    pub anon_key: String,

    /// HS256 secret used to verify user access tokens
    pub jwt_secret: String,

    #[serde(default = "default_bucket")]
    pub storage_bucket: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn required(name: &str) -> DeskResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| DeskError::Config(format!("{} environment variable is required", name)))
}

impl PlatformConfig {
    pub fn new(
        url: impl Into<String>,
        anon_key: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> DeskResult<Self> {
        let config = Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            jwt_secret: jwt_secret.into(),
            storage_bucket: default_bucket(),
            timeout_seconds: default_timeout_seconds(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from the environment
    pub fn from_env() -> DeskResult<Self> {
        let mut config = Self::new(
            required("PLATFORM_URL")?,
            required("PLATFORM_ANON_KEY")?,
            required("PLATFORM_JWT_SECRET")?,
        )?;

        if let Ok(bucket) = env::var("PLATFORM_STORAGE_BUCKET") {
            if !bucket.trim().is_empty() {
                config.storage_bucket = bucket;
            }
        }

        if let Ok(timeout) = env::var("PLATFORM_TIMEOUT_SECS") {
            config.timeout_seconds = timeout.parse().map_err(|_| {
                DeskError::Config(format!("PLATFORM_TIMEOUT_SECS is not a number: {}", timeout))
            })?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> DeskResult<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(DeskError::Config(format!(
                "PLATFORM_URL must be an http(s) URL: {}",
                self.url
            )));
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(DeskError::Config(format!(
                "PLATFORM_JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `{url}/rest/v1`
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    /// `{url}/auth/v1`
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url)
    }

    /// `{url}/storage/v1`
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.url)
    }
}
