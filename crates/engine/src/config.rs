//! Run configuration
//!
//! [`MigrateArgs`] carries everything one `up`/`down` run needs. Durations are
//! `std::time::Duration` end to end; string forms such as `10s` or `500ms`
//! are parsed here.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};
use crate::reconciler::ChooseOptions;

/// Default bound for ensuring the ledger, reading it and applying files
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound for opening the database connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameters of one migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Directory holding the migration files
    pub path: PathBuf,
    /// Database URL
    pub url: String,
    pub direction: Direction,
    /// Number of migrations to apply, `0` for all
    pub steps: usize,
    /// Allow migrating up versions older than the newest applied one
    pub no_verify: bool,
    /// Bound for the whole reconcile and apply phase
    pub timeout: Duration,
    /// Bound for opening the connection
    pub connect_timeout: Duration,
}

impl MigrateArgs {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>, direction: Direction) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            direction,
            steps: 0,
            no_verify: false,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_no_verify(mut self, no_verify: bool) -> Self {
        self.no_verify = no_verify;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Reconciler options derived from these arguments
    pub fn choose_options(&self) -> ChooseOptions {
        ChooseOptions {
            steps: self.steps,
            no_verify: self.no_verify,
        }
    }

    /// Check that the required values are present
    pub fn validate(&self) -> MigrateResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(MigrateError::missing_flag("path"));
        }
        if self.url.trim().is_empty() {
            return Err(MigrateError::missing_flag("url"));
        }
        if self.timeout.is_zero() {
            return Err(MigrateError::invalid_flag("timeout-duration", "0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(MigrateError::invalid_flag("db-conn-timeout-duration", "0"));
        }
        Ok(())
    }
}

/// Parse a duration such as `10s`, `250ms`, `2m`, `1h` or bare seconds (`10`).
///
/// `flag` names the option in the error.
pub fn parse_duration(flag: &str, value: &str) -> MigrateResult<Duration> {
    let value = value.trim();
    let invalid = || MigrateError::invalid_flag(flag, value);

    let split = value
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    if number.is_empty() {
        return Err(invalid());
    }

    let number: f64 = number.parse().map_err(|_| invalid())?;
    let seconds = match unit.trim() {
        "" | "s" | "sec" | "secs" => number,
        "ms" => number / 1_000.0,
        "us" | "µs" => number / 1_000_000.0,
        "ns" => number / 1_000_000_000.0,
        "m" | "min" => number * 60.0,
        "h" => number * 3_600.0,
        _ => return Err(invalid()),
    };

    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())
}

/// Parse the deprecated whole-seconds timeout
pub fn parse_timeout_seconds(flag: &str, value: &str) -> MigrateResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| MigrateError::invalid_flag(flag, value))
}

/// Hide the password of a database URL before it is logged
pub fn mask_url(url: &str) -> String {
    Url::parse(url)
        .map(|mut parsed| {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        })
        .unwrap_or_else(|_| "<unparseable database url>".to_string())
}
