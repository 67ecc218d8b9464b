//! Binary configuration: client settings plus the session directory, with
//! command-line overrides.

use std::path::PathBuf;
use std::time::Duration;

use scriptrelay_client::config::{ClientConfig, ConfigError};

use crate::cli::Cli;

/// Default session log directory, relative to the working directory.
pub const DEFAULT_SESSION_DIR: &str = "sessions";

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub session_dir: PathBuf,
}

impl CliConfig {
    /// Load from the environment. See [`ClientConfig::from_env`] for the
    /// client variables; `SESSION_DIR` defaults to `sessions`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let client = ClientConfig::from_lookup(&lookup)?;
        let session_dir = lookup("SESSION_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR));

        Ok(Self {
            client,
            session_dir,
        })
    }

    /// Apply command-line flags on top of the environment.
    pub fn apply_overrides(&mut self, cli: &Cli) -> Result<(), ConfigError> {
        if let Some(url) = &cli.worker_url {
            self.client.worker_url = url.clone();
        }
        if let Some(dir) = &cli.session_dir {
            self.session_dir = dir.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            if secs == 0 {
                return Err(ConfigError {
                    var: "--timeout-secs",
                    value: "0".into(),
                    reason: "must be positive".into(),
                });
            }
            self.client.default_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn session_dir_defaults_and_overrides() {
        let config = CliConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.session_dir, PathBuf::from("sessions"));

        let config = CliConfig::from_lookup(|var| {
            (var == "SESSION_DIR").then(|| "/var/lib/scriptrelay".to_string())
        })
        .unwrap();
        assert_eq!(config.session_dir, PathBuf::from("/var/lib/scriptrelay"));
    }

    #[test]
    fn flags_take_precedence_over_environment() {
        let mut config = CliConfig::from_lookup(|var| match var {
            "WORKER_WS_URL" => Some("ws://env-host:1".to_string()),
            "SCRIPT_TIMEOUT_SECS" => Some("10".to_string()),
            _ => None,
        })
        .unwrap();

        let cli = Cli::try_parse_from([
            "scriptrelay",
            "--worker-url",
            "ws://flag-host:2",
            "--timeout-secs",
            "45",
        ])
        .unwrap();
        config.apply_overrides(&cli).unwrap();

        assert_eq!(config.client.worker_url, "ws://flag-host:2");
        assert_eq!(config.client.default_timeout, Duration::from_secs(45));
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let mut config = CliConfig::from_lookup(|_| None).unwrap();
        let cli = Cli::try_parse_from(["scriptrelay", "--timeout-secs", "0"]).unwrap();
        assert!(config.apply_overrides(&cli).is_err());
    }
}
