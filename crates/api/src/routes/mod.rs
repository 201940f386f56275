pub mod health;
pub mod invoices;
pub mod jobs;
pub mod profiles;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                   WebSocket (bulk jobs + control)
///
/// /jobs                                 list running jobs
/// /jobs/control                         pause / resume / end (POST)
///
/// /invoices/single                      one-off invoice (POST)
///
/// /profiles/{name}/organization         read (GET), rename (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket.
        .route("/ws", get(ws::ws_handler))
        // Bulk job control.
        .nest("/jobs", jobs::router())
        // Single invoice.
        .nest("/invoices", invoices::router())
        // Organization details per profile.
        .nest("/profiles", profiles::router())
}
