use std::time::Duration;

use jobwatch_client::ReconnectConfig;

/// Default server base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a server on the local machine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the job server (default: `http://localhost:8080`).
    pub api_url: String,
    /// Reconnection delay until the server sends `retry:` (default: `3000` ms).
    pub stream_retry: Duration,
    /// Timeout for job-creation requests (default: `30` s).
    pub request_timeout: Duration,
    /// TCP connect timeout for both endpoints (default: `10` s).
    pub connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            stream_retry: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `API_URL`              | `http://localhost:8080` |
    /// | `STREAM_RETRY_MS`      | `3000`                  |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `CONNECT_TIMEOUT_SECS` | `10`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);

        let stream_retry = match lookup("STREAM_RETRY_MS") {
            Some(v) => Duration::from_millis(parse_number("STREAM_RETRY_MS", &v)?),
            None => defaults.stream_retry,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_positive("REQUEST_TIMEOUT_SECS", &v)?),
            None => defaults.request_timeout,
        };

        let connect_timeout = match lookup("CONNECT_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_positive("CONNECT_TIMEOUT_SECS", &v)?),
            None => defaults.connect_timeout,
        };

        Ok(Self {
            api_url,
            stream_retry,
            request_timeout,
            connect_timeout,
        })
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            default_delay: self.stream_retry,
        }
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        expected: "a non-negative integer",
        value: value.to_string(),
    })
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse_number(var, value) {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            var,
            expected: "a positive integer",
            value: value.to_string(),
        }),
        Ok(n) => Ok(n),
    }
}
