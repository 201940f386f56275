//! Named connection profiles for the external inventory service.
//!
//! Profiles are stored as a JSON array (see `ProfileStore` in the API crate).
//! Only the `inventory` section matters here; unknown sections are ignored.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Message used when a profile has no usable inventory section.
pub const MSG_INVENTORY_MISSING: &str = "Inventory profile configuration is missing.";

/// Message used when the inventory section lacks an organization id.
pub const MSG_ORG_ID_MISSING: &str = "Inventory profile or orgId not configured.";

/// One named set of credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub profile_name: String,
    #[serde(default)]
    pub inventory: Option<InventoryProfile>,
}

/// Inventory service section of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProfile {
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub access_token: String,
    /// Overrides the server-wide API base URL for this profile.
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl Profile {
    /// The inventory section, or a validation error naming what is missing.
    pub fn inventory(&self) -> Result<&InventoryProfile, CoreError> {
        self.inventory
            .as_ref()
            .ok_or_else(|| CoreError::Validation(MSG_INVENTORY_MISSING.to_string()))
    }

    /// The inventory section with a non-empty organization id.
    pub fn inventory_with_org(&self) -> Result<&InventoryProfile, CoreError> {
        match self.inventory.as_ref() {
            Some(inv) if !inv.org_id.trim().is_empty() => Ok(inv),
            _ => Err(CoreError::Validation(MSG_ORG_ID_MISSING.to_string())),
        }
    }
}

/// Find a profile by exact name.
pub fn find_profile<'a>(profiles: &'a [Profile], name: &str) -> Option<&'a Profile> {
    profiles.iter().find(|p| p.profile_name == name)
}
