//! Error types for the migration engine
//!
//! Every variant names the operation that failed so callers can surface the
//! message as-is. Cleanup failures (closing a connection, rolling back a
//! transaction that already failed) never become a `MigrateError`; they are
//! logged as warnings at the point where they happen.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Error types for migration discovery, reconciliation and application
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Listing the migrations directory or reading a matched file failed
    #[error("reading migrations from '{path}' failed: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A matched file name does not start with a valid version
    #[error("parsing version of '{base_name}' failed")]
    MalformedVersion { base_name: String },

    /// Two files of the same direction share a version
    #[error("version {version} is used by both '{first}' and '{second}'")]
    DuplicateVersion {
        version: i64,
        first: String,
        second: String,
    },

    /// Opening or verifying the database connection failed
    #[error("opening database connection failed: {message}")]
    Connection { message: String },

    /// A ledger operation was attempted before the driver was opened
    #[error("database connection is not open")]
    NotConnected,

    /// Ensuring the version ledger table failed
    #[error("creating migrations table failed: {message}")]
    Schema { message: String },

    /// Reading applied versions failed
    #[error("selecting existing migrations failed: {message}")]
    LedgerRead { message: String },

    /// An `up` migration is older than the newest applied version
    #[error("cannot migrate up {file}, because it's older than already migrated version {max_applied}")]
    OutOfOrderMigration { file: String, max_applied: i64 },

    /// A single file's transaction failed and was rolled back
    #[error("applying migration {file} failed: {message}")]
    Apply { file: String, message: String },

    /// The reconcile and apply phase did not finish in time
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// A required positional argument is missing
    #[error("please specify {name}")]
    MissingArgument { name: String },

    /// A required flag is missing or empty
    #[error("please specify {name}")]
    MissingFlag { name: String },

    /// A flag or argument could not be parsed
    #[error("parsing {name} failed")]
    InvalidFlag { name: String, value: String },

    /// Writing a migration file failed
    #[error("{operation} failed for '{path}': {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Create a missing flag error
    pub fn missing_flag(name: impl Into<String>) -> Self {
        MigrateError::MissingFlag { name: name.into() }
    }

    /// Create a missing argument error
    pub fn missing_argument(name: impl Into<String>) -> Self {
        MigrateError::MissingArgument { name: name.into() }
    }

    /// Create an invalid flag error
    pub fn invalid_flag(name: impl Into<String>, value: impl Into<String>) -> Self {
        MigrateError::InvalidFlag {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Whether the error happened before anything touched the database
    pub fn is_before_database(&self) -> bool {
        matches!(
            self,
            MigrateError::Discovery { .. }
                | MigrateError::MalformedVersion { .. }
                | MigrateError::DuplicateVersion { .. }
                | MigrateError::MissingArgument { .. }
                | MigrateError::MissingFlag { .. }
                | MigrateError::InvalidFlag { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_error_messages() {
        assert_eq!(
            MigrateError::missing_flag("path").to_string(),
            "please specify path"
        );
        assert_eq!(
            MigrateError::invalid_flag("<n>", "foobar").to_string(),
            "parsing <n> failed"
        );
    }

    #[test]
    fn test_out_of_order_message() {
        let err = MigrateError::OutOfOrderMigration {
            file: "1494538317_add_phone_number_to_users.up.sql".to_string(),
            max_applied: 1494538407,
        };
        assert_eq!(
            err.to_string(),
            "cannot migrate up 1494538317_add_phone_number_to_users.up.sql, because it's older than already migrated version 1494538407"
        );
        assert!(!err.is_before_database());
    }
}
