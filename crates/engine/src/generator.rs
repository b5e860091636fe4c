//! Migration pair generator
//!
//! Creates the empty `up`/`down` files of a new migration, versioned with the
//! current Unix time in seconds.

use chrono::Utc;
use std::fs::OpenOptions;
use std::path::Path;

use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};
use crate::file::{MigrationFile, MigrationPair};

/// Create a migration pair versioned with the current time
pub fn create_pair(name: &str, dir: &Path) -> MigrateResult<MigrationPair> {
    create_pair_at(name, dir, Utc::now().timestamp())
}

/// Create a migration pair with an explicit version.
///
/// Spaces in `name` become underscores. The `up` file is written first; if the
/// `down` file then fails the `up` file is left in place. Existing files are
/// never overwritten.
pub fn create_pair_at(name: &str, dir: &Path, version: i64) -> MigrateResult<MigrationPair> {
    let slug = name.trim().replace(' ', "_");
    if slug.is_empty() {
        return Err(MigrateError::missing_argument("migration name"));
    }

    let up = create_empty(dir, version, &slug, Direction::Up)?;
    let down = create_empty(dir, version, &slug, Direction::Down)?;

    tracing::info!(version, dir = %dir.display(), "created migration files");

    Ok(MigrationPair { up, down })
}

fn create_empty(
    dir: &Path,
    version: i64,
    slug: &str,
    direction: Direction,
) -> MigrateResult<MigrationFile> {
    let base_name = MigrationFile::file_name(version, slug, direction);
    let path = dir.join(&base_name);

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| MigrateError::Io {
            operation: match direction {
                Direction::Up => "writing up migration file",
                Direction::Down => "writing down migration file",
            },
            path: path.clone(),
            source,
        })?;

    Ok(MigrationFile {
        version,
        base_name,
        body: String::new(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileCatalog;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_pair_writes_two_empty_files() {
        let dir = TempDir::new().unwrap();

        let pair = create_pair_at("add users", dir.path(), 1700000000).unwrap();

        assert_eq!(pair.version(), 1700000000);
        assert_eq!(pair.up.base_name, "1700000000_add_users.up.sql");
        assert_eq!(pair.down.base_name, "1700000000_add_users.down.sql");
        assert_eq!(fs::read_to_string(&pair.up.path).unwrap(), "");
        assert_eq!(fs::read_to_string(&pair.down.path).unwrap(), "");
    }

    #[test]
    fn test_created_pair_is_discoverable() {
        let dir = TempDir::new().unwrap();
        let pair = create_pair_at("create table users", dir.path(), 1494538273).unwrap();

        let catalog = FileCatalog::new(dir.path());
        let up = catalog.list(Direction::Up).unwrap();
        let down = catalog.list(Direction::Down).unwrap();

        assert_eq!(up, vec![pair.up]);
        assert_eq!(down, vec![pair.down]);
        assert_eq!(up[0].slug(), "create_table_users");
    }

    #[test]
    fn test_create_pair_uses_current_time() {
        let dir = TempDir::new().unwrap();
        let before = Utc::now().timestamp();

        let pair = create_pair("add users", dir.path()).unwrap();

        let after = Utc::now().timestamp();
        assert!(pair.version() >= before && pair.version() <= after);
        assert_eq!(pair.up.version, pair.down.version);
        assert!(pair.up.path.exists());
        assert!(pair.down.path.exists());
    }

    #[test]
    fn test_create_pair_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("42_seed.down.sql"), "DELETE FROM users;").unwrap();

        let err = create_pair_at("seed", dir.path(), 42).unwrap_err();

        assert!(matches!(
            err,
            MigrateError::Io { operation: "writing down migration file", .. }
        ));
        // up file stays behind, existing down file is untouched
        assert!(dir.path().join("42_seed.up.sql").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("42_seed.down.sql")).unwrap(),
            "DELETE FROM users;"
        );
    }

    #[test]
    fn test_create_pair_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = create_pair_at("x", &dir.path().join("nope"), 1).unwrap_err();
        assert!(matches!(err, MigrateError::Io { operation: "writing up migration file", .. }));
    }

    #[test]
    fn test_create_pair_requires_name() {
        let dir = TempDir::new().unwrap();
        let err = create_pair_at("   ", dir.path(), 1).unwrap_err();
        assert_eq!(err.to_string(), "please specify migration name");
    }
}
