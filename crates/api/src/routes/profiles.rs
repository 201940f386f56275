//! Route definitions for per-profile resources.

use axum::routing::get;
use axum::Router;

use crate::handlers::organization;
use crate::state::AppState;

/// Routes mounted at `/profiles`.
///
/// ```text
/// GET    /{name}/organization   -> get_organization
/// PUT    /{name}/organization   -> update_organization
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{name}/organization",
        get(organization::get_organization).put(organization::update_organization),
    )
}
