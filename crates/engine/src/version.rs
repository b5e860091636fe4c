//! Applied version set

use std::collections::BTreeSet;

/// Versions that have been migrated up and not yet reverted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet {
    versions: BTreeSet<i64>,
}

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest applied version, `0` when nothing is applied
    pub fn max(&self) -> i64 {
        self.versions.last().copied().unwrap_or(0)
    }

    pub fn contains(&self, version: i64) -> bool {
        self.versions.contains(&version)
    }

    /// Returns `false` if the version was already present
    pub fn insert(&mut self, version: i64) -> bool {
        self.versions.insert(version)
    }

    /// Returns `false` if the version was not present
    pub fn remove(&mut self, version: i64) -> bool {
        self.versions.remove(&version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Versions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.versions.iter().copied()
    }
}

impl FromIterator<i64> for VersionSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            versions: iter.into_iter().collect(),
        }
    }
}

impl Extend<i64> for VersionSet {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        self.versions.extend(iter);
    }
}
