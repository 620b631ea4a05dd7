//! Administrator-side facade: one matrix, its storage and an audit trail.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::command::CreateOutcome;
use crate::error::{MatrixError, Result};
use crate::matrix::{AccessMatrix, Object, SubjectName};
use crate::storage::{JsonFileStorage, MatrixStorage};

/// A single administrative change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixCommand {
    Create { subject: String, objects: Vec<Object> },
    Grant { subjects: Vec<String>, objects: Vec<Object> },
    Remove { subjects: Vec<String>, objects: Vec<Object> },
    GrantAll { subjects: Vec<String> },
    RemoveAll { subjects: Vec<String> },
    AddSubject { subject: String },
    DeleteSubject { subject: String },
    RenameSubject { from: String, to: String },
    AddObject { object: Object },
    DeleteObject { object: Object },
    RenameObject { from: Object, to: Object },
}

/// What a command did to the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    Created,
    Existing,
    /// Nothing to do (subject or object already present, object absent)
    Unchanged,
}

impl CommandOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, CommandOutcome::Unchanged)
    }
}

impl From<CreateOutcome> for CommandOutcome {
    fn from(outcome: CreateOutcome) -> Self {
        match outcome {
            CreateOutcome::Created => CommandOutcome::Created,
            CreateOutcome::Existing => CommandOutcome::Existing,
        }
    }
}

impl MatrixCommand {
    /// Apply the command. Inputs are validated before anything changes.
    pub fn apply(&self, matrix: &mut AccessMatrix) -> Result<CommandOutcome> {
        let outcome = match self {
            MatrixCommand::Create { subject, objects } => matrix.create(subject, objects)?.into(),
            MatrixCommand::Grant { subjects, objects } => {
                matrix.grant(subjects, objects)?;
                CommandOutcome::Applied
            }
            MatrixCommand::Remove { subjects, objects } => {
                matrix.remove(subjects, objects)?;
                CommandOutcome::Applied
            }
            MatrixCommand::GrantAll { subjects } => {
                matrix.grant_all(subjects)?;
                CommandOutcome::Applied
            }
            MatrixCommand::RemoveAll { subjects } => {
                matrix.remove_all(subjects)?;
                CommandOutcome::Applied
            }
            MatrixCommand::AddSubject { subject } => {
                if matrix.ensure_subject(SubjectName::new(subject.as_str())?) {
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Unchanged
                }
            }
            MatrixCommand::DeleteSubject { subject } => {
                matrix
                    .remove_subject(subject)
                    .ok_or_else(|| MatrixError::not_found(subject.as_str()))?;
                CommandOutcome::Applied
            }
            MatrixCommand::RenameSubject { from, to } => {
                matrix.rename_subject(from, SubjectName::new(to.as_str())?)?;
                CommandOutcome::Applied
            }
            MatrixCommand::AddObject { object } => {
                if matrix.add_object(*object) {
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Unchanged
                }
            }
            MatrixCommand::DeleteObject { object } => {
                if matrix.remove_object(*object) {
                    CommandOutcome::Applied
                } else {
                    CommandOutcome::Unchanged
                }
            }
            MatrixCommand::RenameObject { from, to } => {
                matrix.rename_object(*from, *to)?;
                CommandOutcome::Applied
            }
        };
        Ok(outcome)
    }
}

struct List<'a, T>(&'a [T]);

impl<T: fmt::Display> fmt::Display for List<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for MatrixCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixCommand::Create { subject, objects } => {
                write!(f, "create {} -> {}", subject, List(objects))
            }
            MatrixCommand::Grant { subjects, objects } => {
                write!(f, "grant {} -> {}", List(subjects), List(objects))
            }
            MatrixCommand::Remove { subjects, objects } => {
                write!(f, "remove {} -/-> {}", List(subjects), List(objects))
            }
            MatrixCommand::GrantAll { subjects } => write!(f, "grant_all {}", List(subjects)),
            MatrixCommand::RemoveAll { subjects } => write!(f, "remove_all {}", List(subjects)),
            MatrixCommand::AddSubject { subject } => write!(f, "added subject {}", subject),
            MatrixCommand::DeleteSubject { subject } => write!(f, "deleted subject {}", subject),
            MatrixCommand::RenameSubject { from, to } => {
                write!(f, "renamed subject {} -> {}", from, to)
            }
            MatrixCommand::AddObject { object } => write!(f, "added object {}", object),
            MatrixCommand::DeleteObject { object } => write!(f, "deleted object {}", object),
            MatrixCommand::RenameObject { from, to } => {
                write!(f, "renamed object {} -> {}", from, to)
            }
        }
    }
}

/// Owns the administrator's matrix together with its storage.
///
/// Commands change only the in-memory matrix; [`save`](Self::save) is the
/// sole way anything reaches storage.
pub struct AdminConsole<S: MatrixStorage> {
    storage: S,
    matrix: AccessMatrix,
    audit: Option<Box<dyn AuditLog>>,
    dirty: bool,
}

impl<S: MatrixStorage> AdminConsole<S> {
    /// Load tolerantly; a load failure leaves an empty matrix and is handed
    /// back to the caller.
    pub fn open(storage: S) -> (Self, Option<MatrixError>) {
        let report = storage.load_or_empty();
        let console = Self {
            storage,
            matrix: report.matrix,
            audit: None,
            dirty: false,
        };
        (console, report.error)
    }

    pub fn with_audit(mut self, audit: impl AuditLog + 'static) -> Self {
        self.audit = Some(Box::new(audit));
        self
    }

    pub fn matrix(&self) -> &AccessMatrix {
        &self.matrix
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply a command and record it in the audit trail.
    pub fn execute(&mut self, command: MatrixCommand) -> Result<CommandOutcome> {
        let outcome = command.apply(&mut self.matrix)?;
        if outcome.is_change() {
            self.dirty = true;
            match outcome {
                CommandOutcome::Created => self.audit(&format!("{} (created)", command)),
                CommandOutcome::Existing => self.audit(&format!("{} (existing)", command)),
                _ => self.audit(&command.to_string()),
            }
        }
        Ok(outcome)
    }

    /// Persist the matrix. On failure nothing in memory changes.
    pub fn save(&mut self) -> Result<()> {
        self.storage.save(&self.matrix)?;
        self.dirty = false;
        self.audit(&format!("matrix saved to {}", self.storage.describe()));
        Ok(())
    }

    /// Discard in-memory state and load again.
    pub fn reload(&mut self) -> Option<MatrixError> {
        let report = self.storage.load_or_empty();
        self.matrix = report.matrix;
        self.dirty = false;
        report.error
    }

    /// Replace the matrix with the contents of another file.
    ///
    /// The imported matrix still has to be saved to take effect.
    pub fn import_from(&mut self, path: &Path) -> Result<()> {
        let matrix = JsonFileStorage::new(path).load()?;
        info!(path = %path.display(), "matrix imported");
        self.matrix = matrix;
        self.dirty = true;
        self.audit(&format!("imported matrix from {}", path.display()));
        Ok(())
    }

    /// Write the matrix to another file, leaving the primary storage alone.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        JsonFileStorage::new(path).save(&self.matrix)?;
        self.audit(&format!("exported matrix to {}", path.display()));
        Ok(())
    }

    fn audit(&self, message: &str) {
        if let Some(log) = &self.audit {
            if let Err(e) = log.record(message) {
                warn!(error = %e, "failed to append audit record");
            }
        }
    }
}
