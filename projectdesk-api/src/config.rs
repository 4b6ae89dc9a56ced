/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `PRODUCTION`: Enables HSTS when `true` (default: false)
/// - `PROJECTDESK_BACKEND`: `platform` (default) or `memory`
/// - `PLATFORM_*`: hosted platform settings, see [`PlatformConfig`]
/// - `DATABASE_URL`: the platform's Postgres, used for the change feed (required for
///   `platform`)
/// - `LOCAL_JWT_SECRET`: token secret of the memory backend
/// - `PUBLIC_URL`: prefix of file URLs served by the memory backend
///   (default: http://localhost:{API_PORT})
/// - `RUST_LOG`: Log level
///
/// # Example
///
/// ```no_run
/// use projectdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use projectdesk_shared::config::{PlatformConfig, MIN_JWT_SECRET_LENGTH};
use projectdesk_shared::db::pool::DatabaseConfig;
use std::env;

/// Token secret used by the memory backend when `LOCAL_JWT_SECRET` is unset
pub const DEV_JWT_SECRET: &str = "projectdesk-local-development-secret";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Which backend requests are served from
    pub backend: BackendConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            production: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Hosted platform plus its Postgres for the change feed
    Platform {
        platform: PlatformConfig,
        database: DatabaseConfig,
    },

    /// In-process tables and local accounts
    Memory { jwt_secret: String, public_url: String },
}

impl BackendConfig {
    /// Secret that verifies bearer tokens
    pub fn token_secret(&self) -> &str {
        match self {
            BackendConfig::Platform { platform, .. } => &platform.jwt_secret,
            BackendConfig::Memory { jwt_secret, .. } => jwt_secret,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Platform { .. } => "platform",
            BackendConfig::Memory { .. } => "memory",
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let mut cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default());
        if cors_origins.is_empty() {
            cors_origins.push("*".to_string());
        }

        let production = env::var("PRODUCTION").map(|v| parse_flag(&v)).unwrap_or(false);

        let backend = match env::var("PROJECTDESK_BACKEND")
            .unwrap_or_else(|_| "platform".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "platform" => {
                let platform = PlatformConfig::from_env()?;
                let database = DatabaseConfig::from_env()?.ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable is required for the platform backend")
                })?;
                BackendConfig::Platform { platform, database }
            }
            "memory" => {
                let jwt_secret =
                    env::var("LOCAL_JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
                if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
                    anyhow::bail!(
                        "LOCAL_JWT_SECRET must be at least {} characters long",
                        MIN_JWT_SECRET_LENGTH
                    );
                }
                let public_url = env::var("PUBLIC_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}", port));
                BackendConfig::Memory {
                    jwt_secret,
                    public_url,
                }
            }
            other => anyhow::bail!("PROJECTDESK_BACKEND must be platform or memory, got {}", other),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            backend,
        })
    }

    /// Configuration for the in-memory backend, used by tests and local runs
    pub fn memory(jwt_secret: impl Into<String>) -> Self {
        let api = ApiConfig::default();
        Self {
            backend: BackendConfig::Memory {
                jwt_secret: jwt_secret.into(),
                public_url: format!("http://localhost:{}", api.port),
            },
            api,
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::memory(DEV_JWT_SECRET);
        config.api.host = "127.0.0.1".to_string();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.backend.name(), "memory");
        assert_eq!(config.backend.token_secret(), DEV_JWT_SECRET);
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_dev_secret_is_long_enough() {
        assert!(DEV_JWT_SECRET.len() >= MIN_JWT_SECRET_LENGTH);
    }

    #[test]
    fn test_parse_origins_and_flags() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origins(" ").is_empty());
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
    }
}
