//! Configuration module for the AppDynamics data source.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Connection settings for the metric backend.
///
/// Built once when the connector starts and never mutated afterwards, so the
/// fields are only reachable through getters.
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    hosts: Vec<String>,
    timeout: Duration,
}

impl DataSourceConfig {
    /// Create a configuration with only a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
            hosts: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `APPD_URL`: backend base URL (required)
    /// - `APPD_USERNAME` / `APPD_PASSWORD`: basic-auth credentials
    /// - `APPD_HOSTS`: comma-separated list of known hosts
    /// - `APPD_TIMEOUT_SECS`: HTTP timeout in seconds (default: 30)
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("APPD_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("APPD_URL"))?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(base_url));
        }

        let mut cfg = Self::new(base_url);

        if let Some(username) = lookup("APPD_USERNAME") {
            cfg.username = Some(username);
            cfg.password = Some(lookup("APPD_PASSWORD").unwrap_or_default());
        }

        if let Some(hosts) = lookup("APPD_HOSTS") {
            cfg.hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(secs) = lookup("APPD_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.timeout = Duration::from_secs(secs);
            }
        }

        Ok(cfg)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 3000)
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { http_port: 3000 }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `APPD_HTTP_PORT`: HTTP port (default: 3000)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("APPD_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        cfg
    }
}
