//! Version ledger drivers
//!
//! A driver owns the database connection and the `schema_migrations` ledger.
//! The migrator only talks to this trait, so the engine can run against
//! PostgreSQL or against the in-memory driver.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;

use crate::direction::Direction;
use crate::error::MigrateResult;
use crate::file::MigrationFile;
use crate::version::VersionSet;

pub use memory::MemoryDriver;
pub use postgres::PostgresDriver;

/// Connection lifecycle plus the ledger operations the migrator needs
#[async_trait]
pub trait Driver: Send {
    /// Open (and verify) the connection within `connect_timeout`
    async fn open(&mut self, url: &str, connect_timeout: Duration) -> MigrateResult<()>;

    /// Create the ledger table if it does not exist yet
    async fn ensure_schema(&mut self) -> MigrateResult<()>;

    /// Read every applied version
    async fn read_all(&mut self) -> MigrateResult<VersionSet>;

    /// Run `file.body` and record (`Up`) or erase (`Down`) its version in one
    /// transaction. The transaction is rolled back before an error is returned.
    async fn apply_one(&mut self, file: &MigrationFile, direction: Direction) -> MigrateResult<()>;

    /// Release the connection
    async fn close(&mut self) -> MigrateResult<()>;
}
