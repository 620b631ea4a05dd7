//! Persistence backends for the access matrix.
//!
//! The matrix never reaches for a file on its own; whoever owns it is handed
//! a [`MatrixStorage`] and decides when to load and save.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{MatrixError, Result};
use crate::matrix::AccessMatrix;
use crate::watcher::{MtimeWatcher, RevisionWatcher};

/// Default location of the shared matrix file.
pub const DEFAULT_DATA_FILE: &str = "access_matrix.json";

/// Outcome of a tolerant load.
#[derive(Debug)]
pub struct LoadReport {
    /// The loaded matrix, or an empty one if loading failed
    pub matrix: AccessMatrix,
    /// Why loading failed, if it did
    pub error: Option<MatrixError>,
}

/// Storage backend trait, file-backed or in-memory.
pub trait MatrixStorage: Send + Sync {
    /// Load the persisted matrix.
    ///
    /// A missing document is not an error and yields an empty matrix.
    fn load(&self) -> Result<AccessMatrix>;

    /// Persist the matrix, replacing the previous document.
    fn save(&self, matrix: &AccessMatrix) -> Result<()>;

    /// Human-readable location, for messages.
    fn describe(&self) -> String;

    /// Load, falling back to an empty matrix on failure.
    ///
    /// The failure is handed back in the report so the caller can show it.
    fn load_or_empty(&self) -> LoadReport {
        match self.load() {
            Ok(matrix) => LoadReport {
                matrix,
                error: None,
            },
            Err(e) => {
                warn!(location = %self.describe(), error = %e, "failed to load matrix, starting empty");
                LoadReport {
                    matrix: AccessMatrix::new(),
                    error: Some(e),
                }
            }
        }
    }
}

impl<S: MatrixStorage + ?Sized> MatrixStorage for Arc<S> {
    fn load(&self) -> Result<AccessMatrix> {
        (**self).load()
    }

    fn save(&self, matrix: &AccessMatrix) -> Result<()> {
        (**self).save(matrix)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ---- File-backed storage ----

/// Size and timestamps of a matrix file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// A single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A watcher that reports changes to this file.
    pub fn watcher(&self) -> MtimeWatcher {
        MtimeWatcher::new(self.path.clone())
    }

    /// Size and modification time, or `None` if the file does not exist.
    pub fn file_info(&self) -> Result<Option<FileInfo>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let meta = std::fs::metadata(&self.path)?;
        Ok(Some(FileInfo {
            path: self.path.clone(),
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        }))
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl MatrixStorage for JsonFileStorage {
    fn load(&self) -> Result<AccessMatrix> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "matrix file missing, using empty matrix");
            return Ok(AccessMatrix::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let matrix = codec::decode(&contents)?;
        info!(
            path = %self.path.display(),
            subjects = matrix.subject_count(),
            objects = matrix.object_count(),
            "matrix loaded"
        );
        Ok(matrix)
    }

    fn save(&self, matrix: &AccessMatrix) -> Result<()> {
        let contents = codec::encode(matrix)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Write next to the target and rename over it
        let tmp = self.temp_path();
        if let Err(e) = std::fs::write(&tmp, contents.as_bytes()) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %self.path.display(), "matrix saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---- In-memory storage (for testing) ----

/// Keeps the serialized document in memory.
///
/// Every successful save bumps a revision counter that
/// [`RevisionWatcher`] observes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<String>>,
    revision: Arc<AtomicU64>,
    fail_writes: Mutex<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a raw document, as if it had been written by someone else.
    pub fn with_document(document: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.put_raw(document);
        storage
    }

    /// Replace the stored document verbatim.
    pub fn put_raw(&self, document: impl Into<String>) {
        *self.document.lock() = Some(document.into());
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop the stored document, as if the file had been deleted.
    pub fn clear(&self) {
        *self.document.lock() = None;
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    pub fn raw(&self) -> Option<String> {
        self.document.lock().clone()
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn watcher(&self) -> RevisionWatcher {
        RevisionWatcher::new(self.revision.clone())
    }
}

impl MatrixStorage for MemoryStorage {
    fn load(&self) -> Result<AccessMatrix> {
        match self.document.lock().as_deref() {
            Some(doc) => codec::decode(doc),
            None => Ok(AccessMatrix::new()),
        }
    }

    fn save(&self, matrix: &AccessMatrix) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(MatrixError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "memory storage is read-only",
            )));
        }
        let contents = codec::encode(matrix)?;
        self.put_raw(contents);
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
