use std::sync::Arc;

use invoicer_core::job::{ControlAction, JobId, JobKind};
use invoicer_core::profile::{Profile, MSG_INVENTORY_MISSING};
use invoicer_core::recipient::normalize_recipients;
use invoicer_engine::{BulkInvoiceJob, InvoiceTemplate, JobRegistry};

use crate::bulk::progress::ConnectionSink;
use crate::error::AppResult;
use crate::profiles::ProfileStore;
use crate::state::AppState;
use crate::ws::messages::StartBulkInvoice;

/// Register a bulk invoice job for `conn_id` and run it in the background.
///
/// The profile sent inline wins over the stored one. A profile that cannot
/// be resolved still starts the job, which then fails with a configuration
/// error reported as its terminal event.
pub async fn start_bulk_invoice(
    state: &AppState,
    conn_id: &str,
    request: StartBulkInvoice,
) -> AppResult<JobId> {
    let profile_name = request.selected_profile_name.clone();
    let job_id = JobId::new(conn_id, &profile_name, JobKind::Invoice);
    let inter_item_delay = request.inter_item_delay();

    let profile = resolve_profile(&state.profiles, &profile_name, request.active_profile).await;

    let template = InvoiceTemplate::new(request.subject, request.body)
        .with_line_items(request.line_items)
        .with_settle_delay(state.config.settle_delay());

    let job = BulkInvoiceJob {
        job_id: job_id.clone(),
        profile_name,
        profile,
        emails: normalize_recipients(&request.emails),
        template,
        inter_item_delay,
    };

    let running = state.runner.start(job)?;
    let sink = ConnectionSink::new(conn_id, Arc::clone(&state.ws_manager));
    tokio::spawn(async move {
        let report = running.run(&sink).await;
        tracing::debug!(summary = ?report.summary, "Bulk job task finished");
    });

    Ok(job_id)
}

/// The inline profile if one was sent, else the stored profile by name.
///
/// The error is the message the job reports as its critical error.
async fn resolve_profile(
    store: &ProfileStore,
    name: &str,
    inline: Option<Profile>,
) -> Result<Profile, String> {
    if let Some(profile) = inline {
        return Ok(profile);
    }
    match store.find(name).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(MSG_INVENTORY_MISSING.to_string()),
        Err(e) => {
            tracing::error!(profile = %name, error = %e, "Failed to load profiles");
            Err(e.to_string())
        }
    }
}

/// Apply an operator action to a job. Returns whether the job was found.
pub fn apply_control(registry: &JobRegistry, job_id: &JobId, action: ControlAction) -> bool {
    let applied = registry.set_status(job_id, action.target_status());
    if applied {
        tracing::info!(job_id = %job_id, action = ?action, "Job control applied");
    } else {
        tracing::debug!(job_id = %job_id, action = ?action, "Job control for unknown job ignored");
    }
    applied
}
