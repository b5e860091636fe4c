//! Migration direction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// Direction in which migrations are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration (run `.up.sql` files)
    Up,
    /// Revert the migration (run `.down.sql` files)
    Down,
}

impl Direction {
    /// File name suffix before `.sql`
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Plain marker printed in front of each applied file
    pub fn marker(self) -> &'static str {
        match self {
            Direction::Up => ">",
            Direction::Down => "<",
        }
    }

    /// Marker colored for terminal output
    pub fn styled_marker(self) -> console::StyledObject<&'static str> {
        match self {
            Direction::Up => console::style(self.marker()).green(),
            Direction::Down => console::style(self.marker()).red(),
        }
    }

    /// Ledger statement recording (`Up`) or erasing (`Down`) a version
    pub fn ledger_sql(self) -> &'static str {
        match self {
            Direction::Up => "INSERT INTO schema_migrations(version) VALUES($1)",
            Direction::Down => "DELETE FROM schema_migrations WHERE version = $1",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Direction {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(MigrateError::invalid_flag("direction", s)),
        }
    }
}
