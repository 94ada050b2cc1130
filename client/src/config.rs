//! Configuration for the client runtime.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default sync server, matching the server's default port.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
/// Default poll period in seconds.
pub const DEFAULT_POLL_SECS: u64 = 5;
/// Default bound on a single sync request in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
/// Default directory for the local cache.
pub const DEFAULT_CACHE_DIR: &str = ".todosync";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the sync server
    pub server_url: String,
    /// Time between two reconciliations
    pub poll_interval: Duration,
    /// Upper bound for one fetch or push
    pub request_timeout: Duration,
    /// Directory holding the cached store
    pub cache_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// - `TODOSYNC_SERVER_URL`
    /// - `TODOSYNC_POLL_SECS`
    /// - `TODOSYNC_TIMEOUT_SECS`
    /// - `TODOSYNC_CACHE_DIR`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server_url = lookup("TODOSYNC_SERVER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.server_url);
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidServerUrl(server_url));
        }

        let poll_interval = match lookup("TODOSYNC_POLL_SECS") {
            Some(v) => Duration::from_secs(parse_secs(&v).ok_or(ConfigError::InvalidPollInterval)?),
            None => defaults.poll_interval,
        };

        let request_timeout = match lookup("TODOSYNC_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_secs(&v).ok_or(ConfigError::InvalidTimeout)?),
            None => defaults.request_timeout,
        };

        let cache_dir = lookup("TODOSYNC_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        Ok(Self {
            server_url,
            poll_interval,
            request_timeout,
            cache_dir,
        })
    }
}

/// Positive whole seconds.
fn parse_secs(value: &str) -> Option<u64> {
    value.trim().parse().ok().filter(|secs| *secs > 0)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TODOSYNC_SERVER_URL must be an http(s) URL, got '{0}'")]
    InvalidServerUrl(String),

    #[error("Invalid TODOSYNC_POLL_SECS value")]
    InvalidPollInterval,

    #[error("Invalid TODOSYNC_TIMEOUT_SECS value")]
    InvalidTimeout,
}
