//! Configuration loading and types for swiftstore.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Every section has defaults, so an empty file is a
//! valid configuration apart from the credentials, which may also come from
//! the `SWIFTSTORE_USER` / `SWIFTSTORE_KEY` environment variables.

use serde::Deserialize;
use std::path::Path;

use crate::errors::{ReplyPolicy, Result, SwiftError};
use crate::format::ResponseFormat;

/// Default authentication endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://auth.selcdn.ru/";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Client behavior settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Auth endpoint URL.
    #[serde(default = "default_auth_url")]
    pub url: String,

    /// Account user (`X-Auth-User`).
    #[serde(default)]
    pub user: String,

    /// Account key (`X-Auth-Key`).
    #[serde(default)]
    pub key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
            user: String::new(),
            key: String::new(),
        }
    }
}

/// Client behavior settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Listing format: `""`, `json` or `xml`.  Anything else means `""`.
    #[serde(default)]
    pub format: String,

    /// How unexpected status codes are reported.
    #[serde(default)]
    pub reply_policy: ReplyPolicy,
}

impl ClientConfig {
    pub fn response_format(&self) -> ResponseFormat {
        ResponseFormat::resolve(&self.format, ResponseFormat::Plain)
    }
}

/// Transport settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (0 = none).
    #[serde(default)]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification.  Insecure; off by default.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config = parse_config(&contents)?;
    Ok(config)
}

/// Parse configuration text and apply environment overrides.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config: Config = if contents.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(contents)?
    };
    if let Ok(user) = std::env::var("SWIFTSTORE_USER") {
        config.auth.user = user;
    }
    if let Ok(key) = std::env::var("SWIFTSTORE_KEY") {
        config.auth.key = key;
    }
    Ok(config)
}

impl Config {
    /// Fail early when no credentials were provided.
    pub fn validate(&self) -> Result<()> {
        if self.auth.user.is_empty() || self.auth.key.is_empty() {
            return Err(SwiftError::Config(
                "auth.user and auth.key are required".to_string(),
            ));
        }
        Ok(())
    }
}
