//! Route definitions for the `/invoices` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::invoices;
use crate::state::AppState;

/// Routes mounted at `/invoices`.
///
/// ```text
/// POST   /single          -> send_single
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/single", post(invoices::send_single))
}
