//! # Access Matrix - Discretionary Access Control over a Shared File
//!
//! This crate maintains an access-control matrix: named subjects, the
//! single-letter objects they may access, and the relation between them.
//! The matrix is persisted as one JSON document shared between an
//! administrator process that changes it and reader processes that filter
//! text through it.
//!
//! ## Key Components
//!
//! - [`AccessMatrix`]: in-memory matrix with invariant-preserving mutators
//! - Command operations ([`AccessMatrix::create`], [`AccessMatrix::grant`],
//!   [`AccessMatrix::remove`], [`AccessMatrix::grant_all`],
//!   [`AccessMatrix::remove_all`]): validated, all-or-nothing batches
//! - [`codec`]: JSON document format with tolerant defaults
//! - [`MatrixStorage`]: injected persistence ([`JsonFileStorage`],
//!   [`MemoryStorage`])
//! - [`ChangeSyncPoller`]: keeps a reader's [`PermissionSnapshot`] in step
//!   with the shared file
//! - [`AdminConsole`]: matrix + storage + audit trail for administrators
//!
//! ## Example
//!
//! ```rust
//! use access_matrix::{parse_objects, AccessMatrix, CreateOutcome};
//!
//! let mut matrix = AccessMatrix::new();
//! let outcome = matrix.create("alice", &parse_objects("AB")?)?;
//! assert_eq!(outcome, CreateOutcome::Created);
//!
//! matrix.grant(&["alice"], &parse_objects("c")?)?;
//! let allowed = matrix.permissions("alice").unwrap();
//! assert_eq!(access_matrix::filter("cabABC", allowed), "ABc");
//! # Ok::<(), access_matrix::MatrixError>(())
//! ```
//!
//! ## Consistency Model
//!
//! One writer and any number of readers coordinate only through the file.
//! Readers may see a stale matrix for up to one poll interval; concurrent
//! writers are last-write-wins.

pub mod admin;
pub mod audit;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod storage;
pub mod sync;
pub mod watcher;

// Re-export main types
pub use admin::{AdminConsole, CommandOutcome, MatrixCommand};
pub use audit::{AuditLog, FileAuditLog, MemoryAuditLog, DEFAULT_AUDIT_FILE};
pub use codec::MatrixDocument;
pub use command::{parse_objects, parse_subjects, CreateOutcome};
pub use config::MatrixConfig;
pub use error::{ErrorKind, MatrixError, Result};
pub use filter::filter;
pub use matrix::{AccessMatrix, Object, PermissionSet, SubjectName, MAX_SUBJECT_LEN};
pub use storage::{
    FileInfo, JsonFileStorage, LoadReport, MatrixStorage, MemoryStorage, DEFAULT_DATA_FILE,
};
pub use sync::{
    ChangeSyncPoller, PermissionSnapshot, PollOutcome, PollState, ReaderSession,
    DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
pub use watcher::{ChangeStatus, ChangeWatcher, MtimeWatcher, RevisionWatcher};
