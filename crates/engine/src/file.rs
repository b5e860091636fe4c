//! Migration files - discovery, parsing and ordering
//!
//! Migration files live directly under one directory and are named
//! `<version>_<slug>.<up|down>.sql`. The catalog lists the files for one
//! direction, parses their versions and orders them so that `up` files run
//! oldest first and `down` files newest first.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::direction::Direction;
use crate::error::{MigrateError, MigrateResult};

/// `<prefix>_<anything>.<up|down>.sql`; the prefix is validated separately
static FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<version>[^_]*)_(?P<slug>.*)\.(?P<direction>up|down)\.sql$")
        .expect("migration file name pattern is valid")
});

/// A single migration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Version parsed from the file name prefix
    pub version: i64,
    /// File name, e.g. `1494538273_create_table_users.up.sql`
    pub base_name: String,
    /// SQL executed verbatim by the driver
    pub body: String,
    /// Full path of the file
    pub path: PathBuf,
}

impl MigrationFile {
    /// Build the file name for a version, slug and direction
    pub fn file_name(version: i64, slug: &str, direction: Direction) -> String {
        format!("{}_{}.{}.sql", version, slug, direction.suffix())
    }

    /// Slug between the version prefix and the direction suffix
    pub fn slug(&self) -> &str {
        FILE_NAME
            .captures(&self.base_name)
            .and_then(|caps| caps.name("slug"))
            .map_or("", |m| m.as_str())
    }
}

/// The `up` and `down` files of one logical migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPair {
    pub up: MigrationFile,
    pub down: MigrationFile,
}

impl MigrationPair {
    pub fn version(&self) -> i64 {
        self.up.version
    }
}

/// Parse the version out of a migration file name.
///
/// Returns `Ok(None)` when the name is not a migration file for `direction`.
pub fn parse_version(base_name: &str, direction: Direction) -> MigrateResult<Option<i64>> {
    let caps = match FILE_NAME.captures(base_name) {
        Some(caps) => caps,
        None => return Ok(None),
    };

    if &caps["direction"] != direction.suffix() {
        return Ok(None);
    }

    let prefix = &caps["version"];
    let malformed = || MigrateError::MalformedVersion {
        base_name: base_name.to_string(),
    };

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    prefix.parse::<i64>().map(Some).map_err(|_| malformed())
}

/// Find a file by version
pub fn find_by_version(version: i64, files: &[MigrationFile]) -> Option<&MigrationFile> {
    files.iter().find(|file| file.version == version)
}

/// Lists migration files from a directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List the migration files for a direction, bodies included.
    ///
    /// Any unreadable entry or malformed version aborts the whole listing.
    pub fn list(&self, direction: Direction) -> MigrateResult<Vec<MigrationFile>> {
        let discovery = |source| MigrateError::Discovery {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(discovery)? {
            let entry = entry.map_err(discovery)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let base_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let version = match parse_version(&base_name, direction)? {
                Some(version) => version,
                None => continue,
            };

            let body = fs::read_to_string(&path).map_err(|source| MigrateError::Discovery {
                path: path.clone(),
                source,
            })?;

            files.push(MigrationFile {
                version,
                base_name,
                body,
                path,
            });
        }

        check_unique_versions(&files)?;
        sort_files(&mut files, direction);

        tracing::debug!(
            dir = %self.dir.display(),
            direction = %direction,
            count = files.len(),
            "listed migration files"
        );

        Ok(files)
    }
}

fn check_unique_versions(files: &[MigrationFile]) -> MigrateResult<()> {
    let mut seen: HashMap<i64, &str> = HashMap::new();
    for file in files {
        if let Some(first) = seen.insert(file.version, &file.base_name) {
            let (first, second) = if first < file.base_name.as_str() {
                (first, file.base_name.as_str())
            } else {
                (file.base_name.as_str(), first)
            };
            return Err(MigrateError::DuplicateVersion {
                version: file.version,
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }
    Ok(())
}

/// Numeric version order, ascending for `up` and descending for `down`
fn sort_files(files: &mut [MigrationFile], direction: Direction) {
    files.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.base_name.cmp(&b.base_name))
    });

    if direction == Direction::Down {
        files.reverse();
    }
}
