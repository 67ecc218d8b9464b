//! Client configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Default worker endpoint.
pub const DEFAULT_WORKER_URL: &str = "ws://127.0.0.1:9876";

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} has invalid value {value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Settings for [`crate::ScriptClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Worker WebSocket endpoint.
    pub worker_url: String,
    /// Timeout applied by callers that do not pick their own.
    pub default_timeout: Duration,
    /// Limit on a single connect attempt.
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_url: DEFAULT_WORKER_URL.to_string(),
            default_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default               |
    /// |--------------------------|-----------------------|
    /// | `WORKER_WS_URL`          | `ws://127.0.0.1:9876` |
    /// | `SCRIPT_TIMEOUT_SECS`    | `30`                  |
    /// | `CONNECT_TIMEOUT_SECS`   | `5`                   |
    /// | `RETRY_MAX_ATTEMPTS`     | `3`                   |
    /// | `RETRY_INITIAL_DELAY_MS` | `500`                 |
    /// | `RETRY_MAX_DELAY_MS`     | `5000`                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let worker_url = lookup("WORKER_WS_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.worker_url);

        let timeout_secs: u64 = parse_var(&lookup, "SCRIPT_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError {
                var: "SCRIPT_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        let connect_timeout_secs: u64 = parse_var(&lookup, "CONNECT_TIMEOUT_SECS", 5)?;

        let max_attempts: u32 = parse_var(&lookup, "RETRY_MAX_ATTEMPTS", 3)?;
        if max_attempts == 0 {
            return Err(ConfigError {
                var: "RETRY_MAX_ATTEMPTS",
                value: "0".into(),
                reason: "at least one attempt is required".into(),
            });
        }
        let initial_delay_ms: u64 = parse_var(&lookup, "RETRY_INITIAL_DELAY_MS", 500)?;
        let max_delay_ms: u64 = parse_var(&lookup, "RETRY_MAX_DELAY_MS", 5000)?;

        Ok(Self {
            worker_url,
            default_timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig {
                max_attempts,
                initial_delay: Duration::from_millis(initial_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms),
                ..defaults.retry
            },
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
