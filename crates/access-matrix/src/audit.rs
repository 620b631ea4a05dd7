//! Audit trail of administrative changes.
//!
//! Each successful mutation can be recorded as one timestamped line:
//!
//! ```text
//! [2024-05-01 12:00:00] grant [alice, bob] -> [A, c]
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::RwLock;

use crate::error::Result;

/// Default audit file name used by the command-line shell.
pub const DEFAULT_AUDIT_FILE: &str = "admin_log.txt";

/// Trait for audit sinks
pub trait AuditLog: Send + Sync {
    /// Append one record
    fn record(&self, message: &str) -> Result<()>;
}

/// Format a record with the current local time.
pub fn format_line(message: &str) -> String {
    format!("[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message)
}

/// In-memory audit log for testing
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    lines: RwLock<Vec<String>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded lines
    pub fn lines(&self) -> Vec<String> {
        self.lines.read().clone()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, message: &str) -> Result<()> {
        self.lines.write().push(format_line(message));
        Ok(())
    }
}

/// Append-only text file
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn record(&self, message: &str) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(message))?;
        Ok(())
    }
}
