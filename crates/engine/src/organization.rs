//! Read and rename the organization behind a profile.

use invoicer_core::profile::{Profile, MSG_ORG_ID_MISSING};
use invoicer_inventory::client::InventoryClient;
use invoicer_inventory::gateway::{ApiError, Gateway};
use invoicer_inventory::organization::build_organization_update;
use serde::Serialize;

const MSG_ORG_NOT_FOUND: &str = "Organization not found for this profile.";
const MSG_ORG_NOT_FOUND_FOR_UPDATE: &str = "Could not find the organization to update.";
const MSG_INVALID_UPDATE_RESPONSE: &str = "Invalid response structure from the inventory API after update.";
const MSG_NAME_NOT_UPDATED: &str =
    "API reported success, but the name was not updated. This may be a permissions issue.";

/// Result of an organization read or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_response: Option<serde_json::Value>,
}

impl OrganizationOutcome {
    fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            full_response: None,
        }
    }

    fn failed(error: impl Into<String>, full_response: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            full_response,
        }
    }

    fn from_api_error(err: &ApiError) -> Self {
        Self::failed(err.message(), err.full_response())
    }
}

/// Fetch the organization record for `profile`.
pub async fn get_org_details(gateway: &dyn Gateway, profile: &Profile) -> OrganizationOutcome {
    if profile.inventory_with_org().is_err() {
        return OrganizationOutcome::failed(MSG_ORG_ID_MISSING, None);
    }
    let client = InventoryClient::new(gateway, profile);
    match client.get_organization().await {
        Ok(fetched) => match fetched.data {
            Some(organization) => OrganizationOutcome::ok(organization),
            None => OrganizationOutcome::failed(MSG_ORG_NOT_FOUND, None),
        },
        Err(e) => {
            tracing::warn!(profile = %profile.profile_name, error = %e, "Organization lookup failed");
            OrganizationOutcome::from_api_error(&e)
        }
    }
}

/// Set the organization's contact name to `display_name`.
///
/// The whole record is re-sent, so it is read first. The update only counts
/// as applied when the service echoes the new name back.
pub async fn update_org_details(
    gateway: &dyn Gateway,
    profile: &Profile,
    display_name: &str,
) -> OrganizationOutcome {
    if profile.inventory_with_org().is_err() {
        return OrganizationOutcome::failed(MSG_ORG_ID_MISSING, None);
    }
    let client = InventoryClient::new(gateway, profile);

    let current = match client.get_organization().await {
        Ok(fetched) => fetched.data,
        Err(e) => return OrganizationOutcome::from_api_error(&e),
    };
    let Some(organization) = current else {
        return OrganizationOutcome::failed(MSG_ORG_NOT_FOUND_FOR_UPDATE, None);
    };

    let update = build_organization_update(&organization, display_name);
    let updated = match client.update_organization(update).await {
        Ok(updated) => updated,
        Err(e) => {
            tracing::warn!(profile = %profile.profile_name, error = %e, "Organization update failed");
            return OrganizationOutcome::from_api_error(&e);
        }
    };

    match updated.data {
        Some(organization) if organization.get("contact_name").and_then(|n| n.as_str()) == Some(display_name) => {
            tracing::info!(profile = %profile.profile_name, "Organization contact name updated");
            OrganizationOutcome::ok(organization)
        }
        Some(_) => OrganizationOutcome::failed(MSG_NAME_NOT_UPDATED, Some(updated.raw)),
        None => OrganizationOutcome::failed(MSG_INVALID_UPDATE_RESPONSE, Some(updated.raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use invoicer_inventory::gateway::Method;
    use std::sync::Mutex;

    /// Answers `GET` with `current` and `PUT` with `after_put`.
    struct OrgService {
        current: serde_json::Value,
        after_put: serde_json::Value,
        puts: Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait]
    impl Gateway for OrgService {
        async fn call(
            &self,
            method: Method,
            _path: &str,
            body: Option<&serde_json::Value>,
            _profile: &Profile,
        ) -> Result<serde_json::Value, ApiError> {
            match method {
                Method::Put => {
                    self.puts.lock().unwrap().push(body.cloned().unwrap_or_default());
                    Ok(self.after_put.clone())
                }
                _ => Ok(self.current.clone()),
            }
        }
    }

    fn service(current: serde_json::Value, after_put: serde_json::Value) -> OrgService {
        OrgService {
            current,
            after_put,
            puts: Mutex::new(Vec::new()),
        }
    }

    fn profile(org_id: &str) -> Profile {
        serde_json::from_value(serde_json::json!({
            "profileName": "Acme",
            "inventory": { "orgId": org_id, "accessToken": "tok" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn get_returns_organization() {
        let gateway = service(
            serde_json::json!({ "organization": { "name": "Acme" } }),
            serde_json::Value::Null,
        );

        let outcome = get_org_details(&gateway, &profile("600")).await;

        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["name"], "Acme");
    }

    #[tokio::test]
    async fn get_without_organization_is_not_found() {
        let gateway = service(serde_json::json!({ "code": 0 }), serde_json::Value::Null);

        let outcome = get_org_details(&gateway, &profile("600")).await;

        assert_eq!(outcome.error.as_deref(), Some(MSG_ORG_NOT_FOUND));
    }

    #[tokio::test]
    async fn missing_org_id_is_rejected_without_calls() {
        let gateway = service(serde_json::Value::Null, serde_json::Value::Null);

        let outcome = update_org_details(&gateway, &profile(" "), "New").await;

        assert_eq!(outcome.error.as_deref(), Some(MSG_ORG_ID_MISSING));
        assert!(gateway.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_sends_full_record_and_confirms_name() {
        let gateway = service(
            serde_json::json!({ "organization": { "name": "Acme", "contact_name": "Old", "fiscal_year_start_month": 0 } }),
            serde_json::json!({ "organization": { "name": "Acme", "contact_name": "New" } }),
        );

        let outcome = update_org_details(&gateway, &profile("600"), "New").await;

        assert!(outcome.success);
        let puts = gateway.puts.lock().unwrap();
        assert_eq!(puts[0]["contact_name"], "New");
        assert_eq!(puts[0]["fiscal_year_start_month"], "january");
    }

    #[tokio::test]
    async fn unchanged_name_is_reported_with_raw_response() {
        let gateway = service(
            serde_json::json!({ "organization": { "contact_name": "Old" } }),
            serde_json::json!({ "code": 0, "organization": { "contact_name": "Old" } }),
        );

        let outcome = update_org_details(&gateway, &profile("600"), "New").await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some(MSG_NAME_NOT_UPDATED));
        assert_eq!(outcome.full_response.unwrap()["code"], 0);
    }
}
