//! # migrate-engine
//!
//! Applies ordered, versioned SQL migration files to a database and keeps
//! track of the applied versions in a `schema_migrations` ledger.
//!
//! Files are named `<version>_<slug>.<up|down>.sql`. The [`FileCatalog`]
//! lists them, [`reconciler::choose`] decides which ones must run, and the
//! [`Migrator`] applies them one transaction per file through a [`Driver`].

pub mod config;
pub mod direction;
pub mod driver;
pub mod error;
pub mod file;
pub mod generator;
pub mod logging;
pub mod migrator;
pub mod reconciler;
pub mod reporter;
pub mod version;

pub use config::{parse_duration, MigrateArgs, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
pub use direction::Direction;
pub use driver::{Driver, MemoryDriver, PostgresDriver};
pub use error::{MigrateError, MigrateResult};
pub use file::{FileCatalog, MigrationFile, MigrationPair};
pub use generator::{create_pair, create_pair_at};
pub use logging::{init_logging, LoggingConfig};
pub use migrator::{MigrationStatus, Migrator, StatusReport};
pub use reconciler::{choose, ChooseOptions};
pub use reporter::{ConsoleReporter, RecordingReporter, Reporter};
pub use version::VersionSet;
