pub mod create;
pub mod migrate;

use clap::Args;
use migrate_engine::{
    config::parse_timeout_seconds, parse_duration, MigrateError, MigrateResult,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
use std::path::PathBuf;
use std::time::Duration;

/// Flags accepted before or after any subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Migrations folder
    #[arg(long, global = true, env = "MIGRATE_PATH")]
    pub path: Option<PathBuf>,

    /// Database URL, for example postgres://user@host:port/database
    #[arg(long, global = true, env = "MIGRATE_URL", hide_env_values = true)]
    pub url: Option<String>,

    /// Show debug logging
    #[arg(long, short, global = true, env = "MIGRATE_VERBOSE")]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true, env = "MIGRATE_LOG_JSON")]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Migrations folder, required and non-empty
    pub fn require_path(&self) -> MigrateResult<PathBuf> {
        self.path
            .clone()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| MigrateError::missing_flag("path"))
    }

    /// Database URL, required and non-empty
    pub fn require_url(&self) -> MigrateResult<String> {
        self.url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| MigrateError::missing_flag("url"))
    }
}

/// Timeouts shared by every command that opens the database
#[derive(Args, Debug, Clone, Default)]
pub struct TimeoutArgs {
    /// Execution timeout, for example 10s or 500ms (defaults to 1s)
    #[arg(long, env = "MIGRATE_TIMEOUT_DURATION")]
    pub timeout_duration: Option<String>,

    /// Execution timeout in whole seconds (deprecated, use --timeout-duration)
    #[arg(long, env = "MIGRATE_TIMEOUT")]
    pub timeout: Option<String>,

    /// Database connection timeout, for example 10s (defaults to 10s)
    #[arg(long, env = "MIGRATE_DB_CONN_TIMEOUT_DURATION")]
    pub db_conn_timeout_duration: Option<String>,
}

impl TimeoutArgs {
    /// Run timeout: `--timeout-duration` wins over the deprecated `--timeout`
    pub fn run_timeout(&self) -> MigrateResult<Duration> {
        if let Some(value) = non_empty(&self.timeout_duration) {
            return parse_duration("timeout-duration", value);
        }

        if let Some(value) = non_empty(&self.timeout) {
            tracing::warn!("--timeout is deprecated, use --timeout-duration");
            return parse_timeout_seconds("timeout", value);
        }

        Ok(DEFAULT_TIMEOUT)
    }

    pub fn connect_timeout(&self) -> MigrateResult<Duration> {
        match non_empty(&self.db_conn_timeout_duration) {
            Some(value) => parse_duration("db-conn-timeout-duration", value),
            None => Ok(DEFAULT_CONNECT_TIMEOUT),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_defaults() {
        let timeouts = TimeoutArgs::default();
        assert_eq!(timeouts.run_timeout().unwrap(), DEFAULT_TIMEOUT);
        assert_eq!(timeouts.connect_timeout().unwrap(), DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_timeout_duration_wins_over_deprecated_seconds() {
        let timeouts = TimeoutArgs {
            timeout_duration: Some("500ms".to_string()),
            timeout: Some("10".to_string()),
            db_conn_timeout_duration: Some("3s".to_string()),
        };
        assert_eq!(timeouts.run_timeout().unwrap(), Duration::from_millis(500));
        assert_eq!(timeouts.connect_timeout().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_deprecated_timeout_is_whole_seconds() {
        let timeouts = TimeoutArgs {
            timeout: Some("10".to_string()),
            ..Default::default()
        };
        assert_eq!(timeouts.run_timeout().unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_required_globals() {
        let global = GlobalArgs {
            path: Some(PathBuf::new()),
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(global.require_path().unwrap_err().to_string(), "please specify path");
        assert_eq!(global.require_url().unwrap_err().to_string(), "please specify url");
    }
}
