//! Handlers for the `/invoices` resource.

use axum::extract::State;
use axum::Json;
use invoicer_engine::single::{send_single_invoice, SingleInvoiceOutcome, SingleInvoiceRequest};

use crate::state::AppState;

/// POST /api/v1/invoices/single
///
/// Always answers 200; failures are described by the outcome's `success`
/// and `error` fields together with the raw service responses.
pub async fn send_single(
    State(state): State<AppState>,
    Json(input): Json<SingleInvoiceRequest>,
) -> Json<SingleInvoiceOutcome> {
    tracing::info!(
        email = %input.email,
        profile = %input.selected_profile_name,
        "Single invoice requested",
    );
    let outcome =
        send_single_invoice(state.gateway.as_ref(), state.profiles.as_ref(), &input).await;
    Json(outcome)
}
