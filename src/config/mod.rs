//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables
//!     → Settings::from_env() (parse, apply defaults)
//!     → Settings (validated, immutable)
//!     → shared by value / Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; there is no reload path
//! - Every field has a default so an empty environment still works
//! - Derived values (bind address, normalized CORS origins) are plain
//!   accessor functions, computed from the loaded fields

use std::env;

use thiserror::Error;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application settings, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Deployment environment (`APP_ENV`, default development).
    pub env: Environment,

    /// Service name (`NAME`).
    pub name: String,

    /// Service version (`VERSION`), if deployed with one.
    pub version: Option<String>,

    /// Google Cloud project id (`PROJECT`). Gates the trace-path field in
    /// log records and selects the Firestore store when present.
    pub project: Option<String>,

    /// Listen host (`HOST`).
    pub host: String,

    /// Listen port (`PORT`).
    pub port: u16,

    /// Prefix the versioned API routes are mounted under (`API_V1_PREFIX`).
    pub api_v1_prefix: String,

    /// Allowed CORS origins (`CORS_ORIGINS`, comma-separated).
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds (`REQUEST_TIMEOUT_SECS`).
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Environment::Development,
            name: "books-api".to_string(),
            version: None,
            project: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_v1_prefix: "/v1".to_string(),
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Unset and empty variables fall back to defaults; a present but
    /// unparsable value is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty strings count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let env = match get("APP_ENV") {
            None => defaults.env,
            Some(v) if v == "development" => Environment::Development,
            Some(v) if v == "production" => Environment::Production,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "APP_ENV",
                    value: v,
                    reason: "expected \"development\" or \"production\"".to_string(),
                })
            }
        };

        let port = match get("PORT") {
            None => defaults.port,
            Some(v) => v.parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                value: v,
                reason: format!("{e}"),
            })?,
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            None => defaults.request_timeout_secs,
            Some(v) => v.parse().map_err(|e| ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: v,
                reason: format!("{e}"),
            })?,
        };

        // The router nests under this prefix and rejects a bare root or
        // trailing slash at mount time; catch bad shapes here instead.
        let api_v1_prefix = match get("API_V1_PREFIX") {
            None => defaults.api_v1_prefix,
            Some(v) if v.starts_with('/') && v.len() > 1 && !v.ends_with('/') => v,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    key: "API_V1_PREFIX",
                    value: v,
                    reason: "expected a non-root path starting with '/' and without a trailing '/'"
                        .to_string(),
                })
            }
        };

        let cors_origins = match get("CORS_ORIGINS") {
            None => defaults.cors_origins,
            Some(v) => v.split(',').map(|s| s.trim().to_string()).collect(),
        };

        Ok(Settings {
            env,
            name: get("NAME").unwrap_or(defaults.name),
            version: get("VERSION"),
            project: get("PROJECT"),
            host: get("HOST").unwrap_or(defaults.host),
            port,
            api_v1_prefix,
            cors_origins,
            request_timeout_secs,
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// CORS origins with any trailing slash removed.
    pub fn all_cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .iter()
            .map(|origin| origin.trim_end_matches('/').to_string())
            .collect()
    }
}
