//! PostgreSQL driver backed by sqlx
//!
//! Uses a single-connection pool. Each migration runs in its own transaction
//! together with the ledger insert/delete, so a file's effects and its ledger
//! entry commit or roll back together.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres, Transaction};
use std::time::Duration;

use super::Driver;
use crate::config::mask_url;
use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};
use crate::file::MigrationFile;
use crate::version::VersionSet;

const CREATE_MIGRATIONS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version bigint NOT NULL PRIMARY KEY
)";

/// Added separately so ledgers created without the column are upgraded in place
const ADD_APPLIED_AT_SQL: &str = "ALTER TABLE schema_migrations
    ADD COLUMN IF NOT EXISTS applied_at timestamptz NOT NULL DEFAULT now()";

const SELECT_VERSIONS_SQL: &str = "SELECT version FROM schema_migrations";

/// Driver for PostgreSQL databases
#[derive(Debug, Default)]
pub struct PostgresDriver {
    pool: Option<PgPool>,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self) -> MigrateResult<&PgPool> {
        self.pool.as_ref().ok_or(MigrateError::NotConnected)
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn open(&mut self, url: &str, connect_timeout: Duration) -> MigrateResult<()> {
        tracing::debug!(url = %mask_url(url), ?connect_timeout, "opening database connection");

        let connect = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .connect(url);

        let pool = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| MigrateError::Connection {
                message: format!(
                    "connecting to {} timed out after {:?}",
                    mask_url(url),
                    connect_timeout
                ),
            })?
            .map_err(|e| MigrateError::Connection {
                message: format!("connecting to {} failed: {}", mask_url(url), e),
            })?;

        self.pool = Some(pool);
        Ok(())
    }

    async fn ensure_schema(&mut self) -> MigrateResult<()> {
        let pool = self.pool()?;

        for sql in [CREATE_MIGRATIONS_TABLE_SQL, ADD_APPLIED_AT_SQL] {
            sqlx::query(sql)
                .execute(pool)
                .await
                .map_err(|e| MigrateError::Schema {
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }

    async fn read_all(&mut self) -> MigrateResult<VersionSet> {
        let pool = self.pool()?;

        let versions: Vec<i64> = sqlx::query_scalar(SELECT_VERSIONS_SQL)
            .fetch_all(pool)
            .await
            .map_err(|e| MigrateError::LedgerRead {
                message: e.to_string(),
            })?;

        Ok(versions.into_iter().collect())
    }

    async fn apply_one(&mut self, file: &MigrationFile, direction: Direction) -> MigrateResult<()> {
        let pool = self.pool()?;
        let apply_error = |message: String| MigrateError::Apply {
            file: file.base_name.clone(),
            message,
        };

        let mut transaction = pool
            .begin()
            .await
            .map_err(|e| apply_error(format!("starting database transaction failed: {}", e)))?;

        if let Err(message) = execute_file(&mut transaction, file, direction).await {
            if let Err(e) = transaction.rollback().await {
                tracing::warn!(
                    file = %file.base_name,
                    error = %e,
                    "rolling back migration transaction failed"
                );
            }
            return Err(apply_error(message));
        }

        transaction
            .commit()
            .await
            .map_err(|e| apply_error(format!("committing migration failed: {}", e)))
    }

    async fn close(&mut self) -> MigrateResult<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        Ok(())
    }
}

/// Run the file body and the ledger statement inside `transaction`
async fn execute_file(
    transaction: &mut Transaction<'_, Postgres>,
    file: &MigrationFile,
    direction: Direction,
) -> Result<(), String> {
    // No bind parameters: sent with the simple query protocol, so a body may
    // hold several statements.
    if !file.body.trim().is_empty() {
        (&mut **transaction)
            .execute(file.body.as_str())
            .await
            .map_err(|e| format!("executing migration failed: {}", e))?;
    }

    sqlx::query(direction.ledger_sql())
        .bind(file.version)
        .execute(&mut **transaction)
        .await
        .map_err(|e| format!("updating schema_migrations failed: {}", e))?;

    Ok(())
}
