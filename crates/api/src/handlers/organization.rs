//! Handlers for `/profiles/{name}/organization`.

use axum::extract::{Path, State};
use axum::Json;
use invoicer_core::error::CoreError;
use invoicer_core::profile::Profile;
use invoicer_engine::organization::{get_org_details, update_org_details, OrganizationOutcome};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    pub display_name: String,
}

/// Resolve a configured profile or fail with 404.
async fn find_profile(state: &AppState, name: &str) -> AppResult<Profile> {
    state
        .profiles
        .find(name)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Profile",
                id: name.to_string(),
            })
        })
}

/// GET /api/v1/profiles/{name}/organization
pub async fn get_organization(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<OrganizationOutcome>> {
    let profile = find_profile(&state, &name).await?;
    Ok(Json(get_org_details(state.gateway.as_ref(), &profile).await))
}

/// PUT /api/v1/profiles/{name}/organization
pub async fn update_organization(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<UpdateOrganization>,
) -> AppResult<Json<OrganizationOutcome>> {
    let display_name = input.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::BadRequest("displayName must not be empty".into()));
    }
    let profile = find_profile(&state, &name).await?;
    tracing::info!(profile = %name, display_name, "Organization rename requested");
    Ok(Json(
        update_org_details(state.gateway.as_ref(), &profile, display_name).await,
    ))
}
