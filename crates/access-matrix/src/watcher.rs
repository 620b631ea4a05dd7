//! Detection of external changes to the persisted matrix.
//!
//! The poller only asks "did it change since last time?"; how that is
//! answered is up to the [`ChangeWatcher`]. Modification-time polling is the
//! default, and a filesystem-event source can be dropped in behind the same
//! trait.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::Result;

/// Answer of a single change check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Unchanged,
    Changed,
}

/// Source of change notifications for a persisted matrix.
pub trait ChangeWatcher: Send {
    /// Compare the backing state with the last observation and record the
    /// new one.
    fn poll(&mut self) -> Result<ChangeStatus>;

    /// Record the current state as seen without reporting a change.
    fn mark_current(&mut self) -> Result<()>;
}

/// Watches a file's last-modified time.
///
/// Appearance, disappearance and a differing timestamp all count as changes.
#[derive(Debug, Clone)]
pub struct MtimeWatcher {
    path: PathBuf,
    last: Option<SystemTime>,
}

impl MtimeWatcher {
    /// Create a watcher that has not observed anything yet.
    ///
    /// Call [`mark_current`](ChangeWatcher::mark_current) after the initial
    /// load so the first tick does not report a spurious change.
    pub fn new(path: PathBuf) -> Self {
        Self { path, last: None }
    }

    pub fn last_observed(&self) -> Option<SystemTime> {
        self.last
    }

    fn stamp(&self) -> Result<Option<SystemTime>> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ChangeWatcher for MtimeWatcher {
    fn poll(&mut self) -> Result<ChangeStatus> {
        let current = self.stamp()?;
        if current == self.last {
            return Ok(ChangeStatus::Unchanged);
        }
        self.last = current;
        Ok(ChangeStatus::Changed)
    }

    fn mark_current(&mut self) -> Result<()> {
        self.last = self.stamp()?;
        Ok(())
    }
}

/// Watches the revision counter of a [`MemoryStorage`](crate::storage::MemoryStorage).
#[derive(Debug, Clone)]
pub struct RevisionWatcher {
    revision: Arc<AtomicU64>,
    last: u64,
}

impl RevisionWatcher {
    pub(crate) fn new(revision: Arc<AtomicU64>) -> Self {
        Self { revision, last: 0 }
    }
}

impl ChangeWatcher for RevisionWatcher {
    fn poll(&mut self) -> Result<ChangeStatus> {
        let current = self.revision.load(Ordering::SeqCst);
        if current == self.last {
            return Ok(ChangeStatus::Unchanged);
        }
        self.last = current;
        Ok(ChangeStatus::Changed)
    }

    fn mark_current(&mut self) -> Result<()> {
        self.last = self.revision.load(Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn mtime_detects_create_modify_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut watcher = MtimeWatcher::new(path.clone());
        watcher.mark_current().unwrap();
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Unchanged);

        std::fs::write(&path, "{}").unwrap();
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Changed);
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Unchanged);

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        let later = watcher.last_observed().unwrap() + Duration::from_secs(5);
        file.set_modified(later).unwrap();
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Changed);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Changed);
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Unchanged);
    }

    #[test]
    fn revision_watcher_follows_counter() {
        let counter = Arc::new(AtomicU64::new(0));
        let mut watcher = RevisionWatcher::new(counter.clone());
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Unchanged);
        counter.fetch_add(1, Ordering::SeqCst);
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Changed);
        counter.fetch_add(1, Ordering::SeqCst);
        watcher.mark_current().unwrap();
        assert_eq!(watcher.poll().unwrap(), ChangeStatus::Unchanged);
    }
}
