//! Runs the engine against a real PostgreSQL database.
//!
//! Set `MIGRATE_TEST_DATABASE_URL` to a disposable database to enable these
//! tests; without it they return early. The tests share one ledger and run
//! serially: concurrent runs against one database are not coordinated.

use migrate_engine::{
    Direction, Driver, MigrateArgs, MigrateError, MigrationFile, Migrator, PostgresDriver,
    RecordingReporter,
};
use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn database_url() -> Option<String> {
    match std::env::var("MIGRATE_TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("MIGRATE_TEST_DATABASE_URL not set, skipping");
            None
        }
    }
}

fn write(dir: &TempDir, name: &str, body: &str) {
    fs::write(dir.path().join(name), body).unwrap();
}

async fn reset(url: &str) {
    let mut driver = PostgresDriver::new();
    driver.open(url, Duration::from_secs(10)).await.unwrap();
    driver.ensure_schema().await.unwrap();
    for (version, table) in [(1, "migrate_test_users"), (2, "migrate_test_posts")] {
        let file = MigrationFile {
            version,
            base_name: format!("{}_reset.down.sql", version),
            body: format!("DROP TABLE IF EXISTS {};", table),
            path: format!("{}_reset.down.sql", version).into(),
        };
        // Best effort: the version may not be in the ledger
        let _ = driver.apply_one(&file, Direction::Down).await;
    }
    driver.close().await.unwrap();
}

fn args(dir: &TempDir, url: &str, direction: Direction) -> MigrateArgs {
    MigrateArgs::new(dir.path(), url, direction).with_timeout(Duration::from_secs(30))
}

#[tokio::test]
#[serial]
async fn test_up_down_round_trip() {
    let Some(url) = database_url() else { return };
    reset(&url).await;

    let dir = TempDir::new().unwrap();
    write(&dir, "1_users.up.sql", "CREATE TABLE migrate_test_users (id int);\nINSERT INTO migrate_test_users VALUES (1);");
    write(&dir, "1_users.down.sql", "DROP TABLE migrate_test_users;");
    write(&dir, "2_posts.up.sql", "CREATE TABLE migrate_test_posts (id int);");
    write(&dir, "2_posts.down.sql", "DROP TABLE migrate_test_posts;");

    let mut migrator = Migrator::new(PostgresDriver::new(), RecordingReporter::new());

    let applied = migrator.migrate(&args(&dir, &url, Direction::Up)).await.unwrap();
    assert_eq!(applied.len(), 2);

    let again = migrator.migrate(&args(&dir, &url, Direction::Up)).await.unwrap();
    assert!(again.is_empty());

    let reverted = migrator.migrate(&args(&dir, &url, Direction::Down)).await.unwrap();
    assert_eq!(
        reverted.iter().map(|f| f.version).collect::<Vec<_>>(),
        vec![2, 1]
    );
}

#[tokio::test]
#[serial]
async fn test_failed_file_is_rolled_back() {
    let Some(url) = database_url() else { return };
    reset(&url).await;

    let dir = TempDir::new().unwrap();
    write(&dir, "1_users.up.sql", "CREATE TABLE migrate_test_users (id int);");
    write(&dir, "1_users.down.sql", "DROP TABLE migrate_test_users;");
    write(&dir, "2_posts.up.sql", "CREATE TABLE migrate_test_posts (id int);\nSELECT * FROM no_such_table;");
    write(&dir, "2_posts.down.sql", "DROP TABLE migrate_test_posts;");

    let mut migrator = Migrator::new(PostgresDriver::new(), RecordingReporter::new());

    let err = migrator.migrate(&args(&dir, &url, Direction::Up)).await.unwrap_err();
    assert!(matches!(err, MigrateError::Apply { ref file, .. } if file == "2_posts.up.sql"));

    let report = migrator.status(&args(&dir, &url, Direction::Up)).await.unwrap();
    let applied: Vec<_> = report
        .migrations
        .iter()
        .filter(|m| m.applied)
        .map(|m| m.version)
        .collect();
    assert_eq!(applied, vec![1]);

    // posts table creation was rolled back with the failing statement
    write(&dir, "2_posts.up.sql", "CREATE TABLE migrate_test_posts (id int);");
    let applied = migrator.migrate(&args(&dir, &url, Direction::Up)).await.unwrap();
    assert_eq!(applied.len(), 1);

    migrator.migrate(&args(&dir, &url, Direction::Down)).await.unwrap();
}
