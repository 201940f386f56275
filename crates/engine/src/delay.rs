//! Cancellable waits used between pipeline steps and between items.

use std::time::Duration;

use invoicer_core::job::{JobId, JobStatus};
use tokio::time::Instant;

use crate::registry::JobRegistry;

/// Fallback re-check interval while a job is paused.
///
/// Pause waiters are woken by the registry's status signal; the interval
/// only bounds how long a missed wake-up could go unnoticed.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How an [`interruptible_delay`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// The job was ended or removed before the duration elapsed.
    Interrupted,
}

/// Sleep for `duration` unless the job is ended or removed first.
///
/// A zero duration returns immediately without consulting the registry.
/// Pausing does not affect this wait; pause handling belongs to the item
/// loop.
pub async fn interruptible_delay(
    registry: &JobRegistry,
    job_id: &JobId,
    duration: Duration,
) -> DelayOutcome {
    if duration.is_zero() {
        return DelayOutcome::Elapsed;
    }
    let deadline = Instant::now() + duration;
    loop {
        let Some(signals) = registry.signals(job_id) else {
            return DelayOutcome::Interrupted;
        };
        if registry.is_stopped(job_id) {
            return DelayOutcome::Interrupted;
        }

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return DelayOutcome::Elapsed,
            // Re-read the status: the job may have been resumed since.
            _ = signals.cancel.cancelled() => {}
        }
    }
}

/// Block while the job is paused.
///
/// Returns the first status observed that is not `paused`, or `None` when
/// the job has disappeared from the registry. Every wake-up re-reads the
/// registry rather than trusting the signal's value.
pub async fn wait_while_paused(registry: &JobRegistry, job_id: &JobId) -> Option<JobStatus> {
    let mut signals = registry.signals(job_id)?;
    loop {
        match registry.get(job_id) {
            Some(JobStatus::Paused) => {}
            other => return other,
        }

        tokio::select! {
            changed = signals.status.changed() => {
                if changed.is_err() {
                    // Entry was replaced or removed; follow the current one.
                    signals = registry.signals(job_id)?;
                }
            }
            _ = signals.cancel.cancelled() => {
                signals = registry.signals(job_id)?;
            }
            _ = tokio::time::sleep(PAUSE_POLL_INTERVAL) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
