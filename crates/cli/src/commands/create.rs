use anyhow::Context;
use migrate_engine::{ConsoleReporter, MigrateError, MigrationPair, Migrator, PostgresDriver};

use super::GlobalArgs;

/// Create an empty up/down migration pair
pub fn create(global: &GlobalArgs, name: Option<&str>) -> anyhow::Result<MigrationPair> {
    let name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MigrateError::missing_argument("migration name"))?;
    let path = global.require_path()?;

    let mut migrator = Migrator::new(PostgresDriver::new(), ConsoleReporter::new());
    let pair = migrator
        .create(name, &path)
        .context("creating migration failed")?;

    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_requires_name() {
        let err = create(&GlobalArgs::default(), None).unwrap_err();
        assert_eq!(err.to_string(), "please specify migration name");

        let err = create(&GlobalArgs::default(), Some("  ")).unwrap_err();
        assert_eq!(err.to_string(), "please specify migration name");
    }

    #[test]
    fn test_create_requires_path() {
        let err = create(&GlobalArgs::default(), Some("add users")).unwrap_err();
        assert_eq!(err.to_string(), "please specify path");
    }

    #[test]
    fn test_create_writes_pair() {
        let dir = TempDir::new().unwrap();
        let global = GlobalArgs {
            path: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let pair = create(&global, Some("add users")).unwrap();

        assert!(dir.path().join(&pair.up.base_name).exists());
        assert!(dir.path().join(&pair.down.base_name).exists());
        assert_eq!(
            pair.up.base_name,
            format!("{}_add_users.up.sql", pair.version())
        );
    }

    #[test]
    fn test_create_failure_is_annotated() {
        let dir = TempDir::new().unwrap();
        let global = GlobalArgs {
            path: Some(dir.path().join("missing")),
            ..Default::default()
        };

        let err = create(&global, Some("add users")).unwrap_err();
        assert!(format!("{:#}", err).starts_with("creating migration failed: writing up migration file failed"));
    }
}
