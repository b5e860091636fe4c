//! Reconciler - decides which migration files need to run
//!
//! Given the catalog (already ordered for the direction) and the versions in
//! the ledger, the reconciler keeps the files whose state differs from the
//! requested direction. For `up` it refuses to back-fill a migration older
//! than the newest applied version unless verification is disabled.

use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};
use crate::file::MigrationFile;
use crate::version::VersionSet;

/// Options controlling which candidates are accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChooseOptions {
    /// Maximum number of files to return, `0` for no limit
    pub steps: usize,
    /// Skip the older-than-applied check for `up`
    pub no_verify: bool,
}

/// Choose the files that must be applied, preserving catalog order.
///
/// `max_applied` is taken once from the snapshot in `applied`; the check is
/// not re-evaluated as if earlier candidates had already been applied.
pub fn choose(
    files: Vec<MigrationFile>,
    applied: &VersionSet,
    direction: Direction,
    options: ChooseOptions,
) -> MigrateResult<Vec<MigrationFile>> {
    let max_applied = applied.max();
    let mut chosen = Vec::new();

    for file in files {
        let is_applied = applied.contains(file.version);

        let needs_migration = match direction {
            Direction::Up => !is_applied,
            Direction::Down => is_applied,
        };
        if !needs_migration {
            continue;
        }

        if direction == Direction::Up && file.version < max_applied {
            if !options.no_verify {
                return Err(MigrateError::OutOfOrderMigration {
                    file: file.base_name,
                    max_applied,
                });
            }
            tracing::warn!(
                file = %file.base_name,
                max_applied,
                "migrating up a version older than the newest applied one"
            );
        }

        chosen.push(file);
    }

    if options.steps > 0 {
        chosen.truncate(options.steps);
    }

    tracing::debug!(
        direction = %direction,
        chosen = chosen.len(),
        max_applied,
        steps = options.steps,
        "chose migrations"
    );

    Ok(chosen)
}
