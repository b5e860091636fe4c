//! Line-oriented output sink
//!
//! Human-facing results (applied files, elapsed time, created files) go
//! through a [`Reporter`]; diagnostics go through `tracing`.

use std::sync::{Arc, Mutex};

use crate::direction::Direction;
use crate::file::MigrationFile;

/// Receives one line of output at a time
pub trait Reporter: Send {
    fn line(&mut self, line: &str);

    /// Report one applied file as `<marker> <base_name>`
    fn applied(&mut self, direction: Direction, file: &MigrationFile) {
        self.line(&format!("{} {}", direction.marker(), file.base_name));
    }
}

/// Writes lines to stdout, coloring direction markers
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn applied(&mut self, direction: Direction, file: &MigrationFile) {
        println!("{} {}", direction.styled_marker(), file.base_name);
    }
}

/// Keeps every line in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whole output joined with newlines
    pub fn output(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, text: &str) -> bool {
        self.output().contains(text)
    }
}

impl Reporter for RecordingReporter {
    fn line(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}
