//! Bulk job runner.
//!
//! Drives the [`InvoicePipeline`] over an ordered recipient list while
//! honouring operator control:
//!
//! 1. Before every item, stop if the job is ended or gone.
//! 2. While paused, block without consuming any delay.
//! 3. Between items, wait the inter-item delay (cut short by `end`) and
//!    re-check.
//! 4. Run the pipeline for the item, forwarding its events.
//!
//! Per-item failures never leave the pipeline. A job-level failure
//! (configuration, or a panic inside the loop) is caught once and reported
//! as the single critical terminal event. The last status decides between
//! `completed` and `ended`; the registry entry is removed only after the
//! terminal event has been emitted.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use invoicer_core::events::{JobEvent, TerminalEvent, TerminalOutcome};
use invoicer_core::job::{JobId, JobKind, JobStatus};
use invoicer_core::profile::Profile;
use invoicer_inventory::client::InventoryClient;
use invoicer_inventory::gateway::Gateway;
use tracing::Instrument;

use crate::delay::{interruptible_delay, wait_while_paused};
use crate::error::JobError;
use crate::pipeline::{InvoicePipeline, InvoiceTemplate};
use crate::registry::JobRegistry;
use crate::sink::EventSink;

/// Message reported when the loop panics.
const MSG_CRITICAL: &str = "A critical server error occurred.";

/// Everything needed to run one bulk invoice job.
#[derive(Debug, Clone)]
pub struct BulkInvoiceJob {
    pub job_id: JobId,
    /// Display name used to key events for the client.
    pub profile_name: String,
    /// The resolved profile, or why it could not be resolved. An error
    /// fails the job with that message before any item runs.
    pub profile: Result<Profile, String>,
    pub emails: Vec<String>,
    pub template: InvoiceTemplate,
    pub inter_item_delay: Duration,
}

/// Item counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of [`RunningJob::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub outcome: TerminalOutcome,
    pub summary: JobSummary,
}

// ---------------------------------------------------------------------------
// BulkRunner
// ---------------------------------------------------------------------------

/// Starts bulk jobs against a shared gateway and registry.
///
/// Cheap to clone; intended to live in server state.
#[derive(Clone)]
pub struct BulkRunner {
    gateway: Arc<dyn Gateway>,
    registry: Arc<JobRegistry>,
}

impl BulkRunner {
    pub fn new(gateway: Arc<dyn Gateway>, registry: Arc<JobRegistry>) -> Self {
        Self { gateway, registry }
    }

    /// Register the job as `running` and hand back the runnable job.
    ///
    /// Fails when a job with the same id is still registered.
    pub fn start(&self, job: BulkInvoiceJob) -> Result<RunningJob, JobError> {
        if !self.registry.try_create(job.job_id.clone()) {
            return Err(JobError::AlreadyRunning(job.job_id));
        }
        tracing::info!(
            job_id = %job.job_id,
            profile = %job.profile_name,
            items = job.emails.len(),
            delay_ms = job.inter_item_delay.as_millis() as u64,
            "Bulk invoice job registered",
        );
        Ok(RunningJob {
            gateway: Arc::clone(&self.gateway),
            registry: Arc::clone(&self.registry),
            job,
        })
    }
}

// ---------------------------------------------------------------------------
// RunningJob
// ---------------------------------------------------------------------------

/// A registered job, ready to be driven to completion.
pub struct RunningJob {
    gateway: Arc<dyn Gateway>,
    registry: Arc<JobRegistry>,
    job: BulkInvoiceJob,
}

impl RunningJob {
    /// Drive every item, emit exactly one terminal event, and remove the
    /// registry entry.
    pub async fn run(self, sink: &dyn EventSink) -> JobReport {
        let span = tracing::info_span!(
            "bulk_job",
            job_id = %self.job.job_id,
            profile = %self.job.profile_name,
        );
        self.run_to_end(sink).instrument(span).await
    }

    async fn run_to_end(self, sink: &dyn EventSink) -> JobReport {
        let mut summary = JobSummary::default();
        let result = AssertUnwindSafe(self.drive(sink, &mut summary))
            .catch_unwind()
            .await;

        let critical = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(panic) => Some(
                panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| MSG_CRITICAL.to_string()),
            ),
        };

        let last_status = self.registry.get(&self.job.job_id);

        let outcome = match critical {
            Some(message) => {
                tracing::error!(error = %message, "Bulk invoice job failed");
                TerminalOutcome::CriticalError { message }
            }
            None if last_status == Some(JobStatus::Ended) => TerminalOutcome::Ended,
            None => TerminalOutcome::Completed,
        };

        tracing::info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            outcome = ?outcome,
            "Bulk invoice job finished",
        );

        sink.emit(JobEvent::Terminal(TerminalEvent {
            profile_name: self.job.profile_name.clone(),
            job_type: JobKind::Invoice,
            outcome: outcome.clone(),
        }))
        .await;

        // The id stays taken until the terminal event is out, so a new job
        // on the same id cannot interleave its events with this one's.
        self.registry.remove(&self.job.job_id);

        JobReport { outcome, summary }
    }

    async fn drive(&self, sink: &dyn EventSink, summary: &mut JobSummary) -> Result<(), JobError> {
        let profile = self
            .job
            .profile
            .as_ref()
            .map_err(|message| JobError::Configuration(message.clone()))?;
        profile.inventory()?;

        let job_id = &self.job.job_id;
        let registry = self.registry.as_ref();
        let client = InventoryClient::new(self.gateway.as_ref(), profile);
        let pipeline = InvoicePipeline::new(client, sink, registry, job_id, &self.job.template);

        for (index, email) in self.job.emails.iter().enumerate() {
            if registry.is_stopped(job_id) {
                tracing::info!(row = index + 1, "Job ended, stopping before item");
                break;
            }

            if !hold_while_paused(registry, job_id, index + 1).await {
                break;
            }

            if index > 0 && !self.job.inter_item_delay.is_zero() {
                interruptible_delay(registry, job_id, self.job.inter_item_delay).await;
                if registry.is_stopped(job_id) {
                    tracing::info!(row = index + 1, "Job ended during delay");
                    break;
                }
                // A pause requested during the delay still holds this item.
                if !hold_while_paused(registry, job_id, index + 1).await {
                    break;
                }
            }

            let outcome = pipeline.process(index + 1, email).await;
            summary.processed += 1;
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        Ok(())
    }
}

/// Block while the job is paused. Returns `false` when the job must stop.
async fn hold_while_paused(registry: &JobRegistry, job_id: &JobId, row: usize) -> bool {
    if registry.get(job_id) != Some(JobStatus::Paused) {
        return true;
    }
    tracing::info!(row, "Job paused");
    match wait_while_paused(registry, job_id).await {
        Some(JobStatus::Running) => {
            tracing::info!(row, "Job resumed");
            true
        }
        _ => {
            tracing::info!(row, "Job ended while paused");
            false
        }
    }
}
