//! Migrator - applies migrations through a driver
//!
//! A run lists the files for the requested direction, opens the driver, then
//! (bounded by the run timeout) ensures the ledger table, reads the applied
//! versions, chooses the files to run and applies them one by one. Each file
//! is its own transaction: when file *k* fails, files before it stay applied
//! and nothing after it is attempted. The driver is closed on every path once
//! it has been opened.
//!
//! Two runs against the same database at the same time are not coordinated;
//! there is no advisory lock around the ledger.

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::config::{mask_url, MigrateArgs};
use crate::direction::Direction;
use crate::driver::Driver;
use crate::error::{MigrateError, MigrateResult};
use crate::file::{FileCatalog, MigrationFile, MigrationPair};
use crate::generator;
use crate::reconciler;
use crate::reporter::Reporter;
use crate::version::VersionSet;

/// State of one `up` migration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub base_name: String,
    pub applied: bool,
}

/// Result of [`Migrator::status`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Every `up` file, oldest first
    pub migrations: Vec<MigrationStatus>,
    /// Applied versions with no `up` file on disk
    pub missing_files: Vec<i64>,
}

impl StatusReport {
    pub fn pending(&self) -> impl Iterator<Item = &MigrationStatus> {
        self.migrations.iter().filter(|m| !m.applied)
    }
}

/// Runs migrations against a [`Driver`] and reports through a [`Reporter`]
pub struct Migrator<D, R> {
    driver: D,
    reporter: R,
}

impl<D: Driver, R: Reporter> Migrator<D, R> {
    pub fn new(driver: D, reporter: R) -> Self {
        Self { driver, reporter }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Apply the migrations selected by `args` and return the applied files.
    ///
    /// An empty result means there was nothing to do.
    pub async fn migrate(&mut self, args: &MigrateArgs) -> MigrateResult<Vec<MigrationFile>> {
        args.validate()?;
        let started = Instant::now();

        let files = FileCatalog::new(&args.path).list(args.direction)?;

        tracing::info!(
            direction = %args.direction,
            path = %args.path.display(),
            url = %mask_url(&args.url),
            files = files.len(),
            steps = args.steps,
            no_verify = args.no_verify,
            "starting migration"
        );

        self.driver.open(&args.url, args.connect_timeout).await?;

        let result = match tokio::time::timeout(args.timeout, self.migrate_files(files, args)).await
        {
            Ok(result) => result,
            Err(_) => Err(MigrateError::Timeout {
                operation: match args.direction {
                    Direction::Up => "migrating up",
                    Direction::Down => "migrating down",
                },
                after: args.timeout,
            }),
        };

        self.close().await;
        let migrated = result?;

        for file in &migrated {
            self.reporter.applied(args.direction, file);
        }
        self.reporter.line("");
        self.reporter
            .line(&format!("{:.4} seconds", started.elapsed().as_secs_f64()));

        tracing::info!(
            direction = %args.direction,
            applied = migrated.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "migration finished"
        );

        Ok(migrated)
    }

    async fn migrate_files(
        &mut self,
        files: Vec<MigrationFile>,
        args: &MigrateArgs,
    ) -> MigrateResult<Vec<MigrationFile>> {
        self.driver.ensure_schema().await?;
        let applied = self.driver.read_all().await?;

        let chosen = reconciler::choose(files, &applied, args.direction, args.choose_options())?;

        for file in &chosen {
            tracing::info!(file = %file.base_name, direction = %args.direction, "applying migration");

            self.driver
                .apply_one(file, args.direction)
                .await
                .map_err(|e| match e {
                    MigrateError::Apply { .. } => e,
                    other => MigrateError::Apply {
                        file: file.base_name.clone(),
                        message: other.to_string(),
                    },
                })?;
        }

        Ok(chosen)
    }

    /// Compare the `up` files in `args.path` with the ledger. Nothing is applied.
    pub async fn status(&mut self, args: &MigrateArgs) -> MigrateResult<StatusReport> {
        args.validate()?;

        let files = FileCatalog::new(&args.path).list(Direction::Up)?;

        self.driver.open(&args.url, args.connect_timeout).await?;

        let result = match tokio::time::timeout(args.timeout, self.read_applied()).await {
            Ok(result) => result,
            Err(_) => Err(MigrateError::Timeout {
                operation: "reading migration status",
                after: args.timeout,
            }),
        };

        self.close().await;
        let applied = result?;

        let migrations = files
            .iter()
            .map(|file| MigrationStatus {
                version: file.version,
                base_name: file.base_name.clone(),
                applied: applied.contains(file.version),
            })
            .collect();

        let missing_files = applied
            .iter()
            .filter(|version| !files.iter().any(|file| file.version == *version))
            .collect();

        Ok(StatusReport {
            migrations,
            missing_files,
        })
    }

    async fn read_applied(&mut self) -> MigrateResult<VersionSet> {
        self.driver.ensure_schema().await?;
        self.driver.read_all().await
    }

    /// Create an empty `up`/`down` pair for a new migration in `dir`
    pub fn create(&mut self, name: &str, dir: &Path) -> MigrateResult<MigrationPair> {
        let pair = generator::create_pair(name, dir)?;

        self.reporter.line(&format!(
            "Version {} migration files created in {}",
            pair.version(),
            dir.display()
        ));
        self.reporter.line(&pair.up.base_name);
        self.reporter.line(&pair.down.base_name);

        Ok(pair)
    }

    async fn close(&mut self) {
        if let Err(e) = self.driver.close().await {
            tracing::warn!(error = %e, "closing database connection failed");
        }
    }
}
