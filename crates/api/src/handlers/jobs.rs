//! Handlers for the `/jobs` resource.
//!
//! Jobs are started over the WebSocket; these endpoints let an operator
//! inspect and steer them out of band.

use axum::extract::State;
use axum::Json;
use invoicer_core::job::{ControlAction, JobId, JobStatus};
use serde::{Deserialize, Serialize};

use crate::bulk::apply_control;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub job_id: JobId,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlRequest {
    pub job_id: JobId,
    pub action: ControlAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResult {
    pub job_id: JobId,
    pub action: ControlAction,
    /// `false` when no such job is running; the request is then a no-op.
    pub applied: bool,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<DataResponse<Vec<JobInfo>>> {
    let jobs = state
        .registry
        .snapshot()
        .into_iter()
        .map(|(job_id, status)| JobInfo { job_id, status })
        .collect();
    Json(DataResponse { data: jobs })
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs/control
///
/// Unknown or finished jobs are not an error: the response reports
/// `applied: false`.
pub async fn control_job(
    State(state): State<AppState>,
    Json(input): Json<ControlRequest>,
) -> AppResult<Json<DataResponse<ControlResult>>> {
    let applied = apply_control(&state.registry, &input.job_id, input.action);
    Ok(Json(DataResponse {
        data: ControlResult {
            job_id: input.job_id,
            action: input.action,
            applied,
        },
    }))
}
