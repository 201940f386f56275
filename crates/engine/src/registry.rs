//! Process-wide job control registry.
//!
//! [`JobRegistry`] maps a [`JobId`] to its control status. It is shared
//! (behind `Arc`) by the bulk runner and by every control entry point, and
//! is the single source of truth for whether a job should keep going.
//!
//! All access goes through one `std::sync::Mutex`; the lock is never held
//! across an `.await`. Besides the status, each entry owns a `watch`
//! channel that wakes pause waiters on every change and a
//! [`CancellationToken`] that fires once the job is ended or removed, so
//! waits react without polling.
//!
//! Ids that are not present read as ended. Late control requests for a
//! finished job are therefore silently ignored.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use invoicer_core::job::{JobId, JobStatus};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Registry-side state of one job.
struct JobControl {
    status: watch::Sender<JobStatus>,
    cancel: CancellationToken,
}

impl JobControl {
    fn new() -> Self {
        let (status, _) = watch::channel(JobStatus::Running);
        Self {
            status,
            cancel: CancellationToken::new(),
        }
    }

    fn current(&self) -> JobStatus {
        *self.status.borrow()
    }
}

/// Wake-up handles for one job, handed to waiters.
///
/// `status` changes on every control request; `cancel` fires when the job
/// is ended or its entry is removed.
#[derive(Clone)]
pub struct JobSignals {
    pub status: watch::Receiver<JobStatus>,
    pub cancel: CancellationToken,
}

/// Shared map of job id to control status.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, JobControl>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobControl>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a `running` entry, replacing any existing one.
    ///
    /// A replaced entry is cancelled so its waiters wake up. Callers that
    /// must not clobber a live job use [`try_create`](Self::try_create).
    pub fn create(&self, id: JobId) {
        if let Some(previous) = self.lock().insert(id.clone(), JobControl::new()) {
            previous.cancel.cancel();
            tracing::warn!(job_id = %id, "Replaced an existing job registry entry");
        }
    }

    /// Install a `running` entry only if the id is free.
    ///
    /// Returns `false` (and changes nothing) when the id is already taken.
    pub fn try_create(&self, id: JobId) -> bool {
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return false;
        }
        jobs.insert(id, JobControl::new());
        true
    }

    /// Set the status of an existing entry.
    ///
    /// Returns whether an entry was found. Unknown ids are a no-op.
    ///
    /// Ending fires the entry's cancellation token. Any later status re-arms
    /// the entry with a fresh token, so waits started afterwards are not
    /// cut short by the earlier `end`.
    pub fn set_status(&self, id: &JobId, status: JobStatus) -> bool {
        let mut jobs = self.lock();
        let Some(control) = jobs.get_mut(id) else {
            return false;
        };
        if status == JobStatus::Ended {
            control.cancel.cancel();
        } else if control.cancel.is_cancelled() {
            control.cancel = CancellationToken::new();
        }
        control.status.send_replace(status);
        true
    }

    /// Current status, or `None` when the id is unknown.
    pub fn get(&self, id: &JobId) -> Option<JobStatus> {
        self.lock().get(id).map(JobControl::current)
    }

    /// Whether the job is absent or ended.
    pub fn is_stopped(&self, id: &JobId) -> bool {
        !matches!(self.get(id), Some(JobStatus::Running | JobStatus::Paused))
    }

    /// Delete an entry, returning its last status. Unknown ids are a no-op.
    ///
    /// Waiters holding the entry's signals are woken.
    pub fn remove(&self, id: &JobId) -> Option<JobStatus> {
        let control = self.lock().remove(id)?;
        control.cancel.cancel();
        Some(control.current())
    }

    /// Subscribe to the entry's change and cancellation signals.
    pub fn signals(&self, id: &JobId) -> Option<JobSignals> {
        self.lock().get(id).map(|control| JobSignals {
            status: control.status.subscribe(),
            cancel: control.cancel.clone(),
        })
    }

    /// Every live entry with its status, sorted by id.
    pub fn snapshot(&self) -> Vec<(JobId, JobStatus)> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, control)| (id.clone(), control.current()))
            .collect();
        entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        entries
    }

    /// Mark every live job as ended. Returns how many were live.
    ///
    /// Used on shutdown; the runners still remove their own entries.
    pub fn end_all(&self) -> usize {
        let jobs = self.lock();
        for control in jobs.values() {
            control.status.send_replace(JobStatus::Ended);
            control.cancel.cancel();
        }
        jobs.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
