//! Reader-side synchronization with the persisted matrix.
//!
//! A reader process keeps a cached copy of the matrix and, once a subject has
//! logged in, a [`PermissionSnapshot`] of that subject's rights. The
//! [`ChangeSyncPoller`] checks the backing store on a fixed interval and, when
//! it changed, reloads the matrix and rebuilds the snapshot in one step.
//!
//! State machine per tick:
//!
//! ```text
//! Idle --tick--> Checking --unchanged--> Idle
//!                         --changed----> Reloading --> Idle
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{MatrixError, Result};
use crate::filter;
use crate::matrix::{AccessMatrix, PermissionSet, SubjectName};
use crate::storage::MatrixStorage;
use crate::watcher::{ChangeStatus, ChangeWatcher};

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Shortest interval [`ChangeSyncPoller::run`] will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A subject's rights as of the last synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSnapshot {
    subject: SubjectName,
    allowed: PermissionSet,
}

impl PermissionSnapshot {
    /// Capture `subject`'s rights; a subject missing from the matrix holds
    /// nothing.
    pub fn capture(matrix: &AccessMatrix, subject: &SubjectName) -> Self {
        Self {
            subject: subject.clone(),
            allowed: matrix
                .permissions(subject.as_str())
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn subject(&self) -> &SubjectName {
        &self.subject
    }

    pub fn allowed(&self) -> &PermissionSet {
        &self.allowed
    }

    pub fn filter(&self, text: &str) -> String {
        filter::filter(text, &self.allowed)
    }

    /// Sorted rights, e.g. `ABc`, or `(no rights)`.
    pub fn rights_display(&self) -> String {
        if self.allowed.is_empty() {
            return "(no rights)".to_string();
        }
        let mut letters: Vec<char> = self.allowed.iter().map(|o| o.as_char()).collect();
        letters.sort_unstable();
        letters.into_iter().collect()
    }
}

/// A reader's cached view of the matrix.
#[derive(Debug)]
pub struct ReaderSession<S: MatrixStorage> {
    storage: S,
    matrix: AccessMatrix,
    snapshot: Option<PermissionSnapshot>,
}

impl<S: MatrixStorage> ReaderSession<S> {
    /// Load the matrix tolerantly; the load error, if any, is returned
    /// alongside the (then empty) session.
    pub fn open(storage: S) -> (Self, Option<MatrixError>) {
        let report = storage.load_or_empty();
        let session = Self {
            storage,
            matrix: report.matrix,
            snapshot: None,
        };
        (session, report.error)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn matrix(&self) -> &AccessMatrix {
        &self.matrix
    }

    pub fn snapshot(&self) -> Option<&PermissionSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Authenticate as `name` against a freshly loaded matrix.
    ///
    /// On failure the cached matrix and any current snapshot are kept as
    /// they were.
    pub fn login(&mut self, name: &str) -> Result<&PermissionSnapshot> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MatrixError::validation("empty user name"));
        }
        let matrix = self.storage.load()?;
        if !matrix.contains_subject(name) {
            return Err(MatrixError::NotFound {
                subject: name.to_string(),
            });
        }
        let subject = SubjectName::new(name)?;
        self.matrix = matrix;
        info!(subject = %subject, "reader authenticated");
        Ok(self
            .snapshot
            .insert(PermissionSnapshot::capture(&self.matrix, &subject)))
    }

    pub fn logout(&mut self) {
        if let Some(snap) = self.snapshot.take() {
            info!(subject = %snap.subject, "reader logged out");
        }
    }

    /// Filter `text` through the current rights.
    ///
    /// `None` means nobody is logged in, which is different from an empty
    /// result.
    pub fn filter(&self, text: &str) -> Option<String> {
        self.snapshot.as_ref().map(|snap| snap.filter(text))
    }

    /// Replace the cached matrix wholesale and rebuild the snapshot.
    ///
    /// Falls back to an empty matrix on load failure and hands the error back.
    pub fn reload(&mut self) -> Option<MatrixError> {
        let report = self.storage.load_or_empty();
        self.matrix = report.matrix;
        if let Some(snap) = self.snapshot.as_mut() {
            let subject = snap.subject.clone();
            *snap = PermissionSnapshot::capture(&self.matrix, &subject);
            debug!(subject = %subject, rights = %snap.rights_display(), "snapshot rebuilt");
        }
        report.error
    }
}

/// Where the poller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Checking,
    Reloading,
}

/// Result of one poll tick.
#[derive(Debug)]
pub enum PollOutcome {
    /// Nothing changed since the last tick
    Unchanged,
    /// The matrix was reloaded; carries the load error if it fell back to
    /// an empty matrix
    Reloaded { load_error: Option<MatrixError> },
    /// The change check itself failed; cached state is untouched
    Failed(MatrixError),
}

/// Periodically reconciles a [`ReaderSession`] with its storage.
pub struct ChangeSyncPoller<S: MatrixStorage, W: ChangeWatcher> {
    session: ReaderSession<S>,
    watcher: W,
    state: PollState,
    updates: watch::Sender<Option<PermissionSnapshot>>,
}

impl<S: MatrixStorage, W: ChangeWatcher> ChangeSyncPoller<S, W> {
    /// Wrap a session that has just been loaded; the watcher is stamped with
    /// the current state so the first tick does not reload needlessly.
    pub fn new(session: ReaderSession<S>, mut watcher: W) -> Self {
        if let Err(e) = watcher.mark_current() {
            warn!(error = %e, "could not stamp matrix state; first tick will reload");
        }
        let (updates, _) = watch::channel(session.snapshot().cloned());
        Self {
            session,
            watcher,
            state: PollState::Idle,
            updates,
        }
    }

    pub fn session(&self) -> &ReaderSession<S> {
        &self.session
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Receive every rebuilt snapshot (or `None` after logout).
    pub fn subscribe(&self) -> watch::Receiver<Option<PermissionSnapshot>> {
        self.updates.subscribe()
    }

    pub fn login(&mut self, name: &str) -> Result<PermissionSnapshot> {
        let snap = self.session.login(name)?.clone();
        self.stamp();
        self.publish();
        Ok(snap)
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.publish();
    }

    pub fn filter(&self, text: &str) -> Option<String> {
        self.session.filter(text)
    }

    /// Reload on demand, outside the tick schedule.
    pub fn reload(&mut self) -> Option<MatrixError> {
        let err = self.session.reload();
        self.stamp();
        self.publish();
        err
    }

    /// Run one check. Never fails: errors are logged and reported in the
    /// outcome.
    pub fn tick(&mut self) -> PollOutcome {
        self.state = PollState::Checking;
        let status = match self.watcher.poll() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "matrix poll failed; retrying on next tick");
                self.state = PollState::Idle;
                return PollOutcome::Failed(e);
            }
        };

        let outcome = match status {
            ChangeStatus::Unchanged => PollOutcome::Unchanged,
            ChangeStatus::Changed => {
                self.state = PollState::Reloading;
                info!(location = %self.session.storage().describe(), "matrix changed, reloading");
                let load_error = self.session.reload();
                self.publish();
                PollOutcome::Reloaded { load_error }
            }
        };
        self.state = PollState::Idle;
        outcome
    }

    /// Tick every `interval` until `shutdown` resolves, then hand the poller
    /// back. Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub async fn run<F>(mut self, interval: Duration, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        tokio::pin!(shutdown);

        info!(interval_ms = interval.as_millis() as u64, "change sync poller started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick();
                }
            }
        }
        info!("change sync poller stopped");
        self
    }

    pub fn into_session(self) -> ReaderSession<S> {
        self.session
    }

    fn stamp(&mut self) {
        if let Err(e) = self.watcher.mark_current() {
            warn!(error = %e, "could not stamp matrix state");
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.snapshot().cloned());
    }
}
