//! In-memory driver
//!
//! Keeps the ledger in a shared [`VersionSet`] and records every call, so the
//! reconcile and apply logic can be exercised without a database. Clones share
//! state: hand one clone to the migrator and inspect the other.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::Driver;
use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};
use crate::file::MigrationFile;
use crate::version::VersionSet;

/// Operation of the driver, used for failure injection and call recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    EnsureSchema,
    ReadAll,
    Apply(i64, Direction),
    Close,
}

#[derive(Debug, Default)]
struct MemoryState {
    applied: VersionSet,
    open: bool,
    schema_ready: bool,
    calls: Vec<Operation>,
    executed: Vec<String>,
    fail_open: bool,
    fail_schema: bool,
    fail_read: bool,
    fail_close: bool,
    fail_apply: Option<i64>,
    apply_delay: Option<Duration>,
}

/// Driver keeping the ledger in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these versions already applied
    pub fn with_applied(self, versions: impl IntoIterator<Item = i64>) -> Self {
        self.state().applied.extend(versions);
        self
    }

    /// Make `open` fail
    pub fn failing_open(self) -> Self {
        self.state().fail_open = true;
        self
    }

    /// Make `ensure_schema` fail
    pub fn failing_schema(self) -> Self {
        self.state().fail_schema = true;
        self
    }

    /// Make `read_all` fail
    pub fn failing_read(self) -> Self {
        self.state().fail_read = true;
        self
    }

    /// Make `close` fail
    pub fn failing_close(self) -> Self {
        self.state().fail_close = true;
        self
    }

    /// Make `apply_one` fail (and leave the ledger untouched) for a version
    pub fn failing_apply(self, version: i64) -> Self {
        self.state().fail_apply = Some(version);
        self
    }

    /// Sleep inside every `apply_one` call
    pub fn with_apply_delay(self, delay: Duration) -> Self {
        self.state().apply_delay = Some(delay);
        self
    }

    /// Current ledger contents
    pub fn applied(&self) -> VersionSet {
        self.state().applied.clone()
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.state().calls.clone()
    }

    /// Bodies executed by successful `apply_one` calls
    pub fn executed(&self) -> Vec<String> {
        self.state().executed.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state().open
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, operation: Operation) -> MutexGuard<'_, MemoryState> {
        let mut state = self.state();
        state.calls.push(operation);
        state
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn open(&mut self, url: &str, _connect_timeout: Duration) -> MigrateResult<()> {
        let mut state = self.record(Operation::Open);
        if state.fail_open {
            return Err(MigrateError::Connection {
                message: format!("cannot reach {}", url),
            });
        }
        state.open = true;
        Ok(())
    }

    async fn ensure_schema(&mut self) -> MigrateResult<()> {
        let mut state = self.record(Operation::EnsureSchema);
        if !state.open {
            return Err(MigrateError::NotConnected);
        }
        if state.fail_schema {
            return Err(MigrateError::Schema {
                message: "permission denied for schema public".to_string(),
            });
        }
        state.schema_ready = true;
        Ok(())
    }

    async fn read_all(&mut self) -> MigrateResult<VersionSet> {
        let state = self.record(Operation::ReadAll);
        if !state.open {
            return Err(MigrateError::NotConnected);
        }
        if state.fail_read || !state.schema_ready {
            return Err(MigrateError::LedgerRead {
                message: "relation \"schema_migrations\" does not exist".to_string(),
            });
        }
        Ok(state.applied.clone())
    }

    async fn apply_one(&mut self, file: &MigrationFile, direction: Direction) -> MigrateResult<()> {
        let delay = {
            let state = self.record(Operation::Apply(file.version, direction));
            if !state.open {
                return Err(MigrateError::NotConnected);
            }
            state.apply_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_apply == Some(file.version) {
            return Err(MigrateError::Apply {
                file: file.base_name.clone(),
                message: "syntax error at or near \"CREAT\"".to_string(),
            });
        }

        let changed = match direction {
            Direction::Up => state.applied.insert(file.version),
            Direction::Down => state.applied.remove(file.version),
        };
        if !changed {
            return Err(MigrateError::Apply {
                file: file.base_name.clone(),
                message: format!("version {} is not in the expected state", file.version),
            });
        }

        state.executed.push(file.body.clone());
        Ok(())
    }

    async fn close(&mut self) -> MigrateResult<()> {
        let mut state = self.record(Operation::Close);
        state.open = false;
        if state.fail_close {
            return Err(MigrateError::Connection {
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(())
    }
}
