//! Typed operations on top of a [`Gateway`].
//!
//! Each operation returns the fields the engine needs together with the raw
//! response body, which is forwarded to clients unmodified.

use invoicer_core::profile::Profile;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::gateway::{ApiError, Gateway, Method};

/// A typed view of a response plus the raw body it was read from.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContactPerson {
    pub contact_person_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    pub contact_id: String,
    #[serde(default)]
    pub contact_persons: Vec<ContactPerson>,
}

impl Contact {
    pub fn contact_person_ids(&self) -> Vec<String> {
        self.contact_persons
            .iter()
            .map(|p| p.contact_person_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Invoice {
    pub invoice_id: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rate: f64,
    pub quantity: u32,
}

impl Default for LineItem {
    /// Placeholder line used when the caller supplies no template.
    fn default() -> Self {
        Self {
            name: "Default Service".to_string(),
            description: None,
            rate: 100.00,
            quantity: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContactPerson<'a> {
    pub email: &'a str,
    pub is_primary_contact: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContact<'a> {
    pub contact_name: &'a str,
    pub contact_persons: Vec<NewContactPerson<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewInvoice<'a> {
    pub customer_id: &'a str,
    #[serde(flatten)]
    pub contacts: InvoiceContacts<'a>,
    pub line_items: &'a [LineItem],
}

/// Contact persons attached to a new invoice, under the field name the
/// calling flow uses.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceContacts<'a> {
    /// Bulk runs send `contact_persons`.
    ContactPersons(&'a [String]),
    /// One-off invoices send `contact_person_ids`.
    ContactPersonIds(&'a [String]),
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactEmail<'a> {
    pub to_mail_ids: Vec<&'a str>,
    pub subject: &'a str,
    pub body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_from_org_email_id: Option<bool>,
}

// ---------------------------------------------------------------------------
// InventoryClient
// ---------------------------------------------------------------------------

/// Inventory API operations bound to one profile.
pub struct InventoryClient<'a> {
    gateway: &'a dyn Gateway,
    profile: &'a Profile,
}

impl<'a> InventoryClient<'a> {
    pub fn new(gateway: &'a dyn Gateway, profile: &'a Profile) -> Self {
        Self { gateway, profile }
    }

    pub fn profile(&self) -> &'a Profile {
        self.profile
    }

    /// `GET /v1/contacts?email=`: the first matching contact, if any.
    pub async fn find_contact_by_email(
        &self,
        email: &str,
    ) -> Result<Fetched<Option<Contact>>, ApiError> {
        let path = format!("/v1/contacts?email={}", urlencoding::encode(email));
        let raw = self.send(Method::Get, &path, None).await?;
        let first = raw
            .get("contacts")
            .and_then(serde_json::Value::as_array)
            .and_then(|contacts| contacts.first())
            .cloned();
        let data = match first {
            Some(value) => Some(decode(value, "contact", &raw)?),
            None => None,
        };
        Ok(Fetched { data, raw })
    }

    /// `POST /v1/contacts` with one primary contact person for `email`.
    pub async fn create_contact(
        &self,
        contact_name: &str,
        email: &str,
    ) -> Result<Fetched<Contact>, ApiError> {
        let request = NewContact {
            contact_name,
            contact_persons: vec![NewContactPerson {
                email,
                is_primary_contact: true,
            }],
        };
        let raw = self.send(Method::Post, "/v1/contacts", Some(to_json(&request)?)).await?;
        let data = decode_field(&raw, "contact")?;
        Ok(Fetched { data, raw })
    }

    /// `GET /v1/contacts/{id}`.
    pub async fn get_contact(&self, contact_id: &str) -> Result<Fetched<Contact>, ApiError> {
        let raw = self
            .send(Method::Get, &format!("/v1/contacts/{contact_id}"), None)
            .await?;
        let data = decode_field(&raw, "contact")?;
        Ok(Fetched { data, raw })
    }

    /// `POST /v1/invoices`.
    pub async fn create_invoice(&self, invoice: &NewInvoice<'_>) -> Result<Fetched<Invoice>, ApiError> {
        let raw = self.send(Method::Post, "/v1/invoices", Some(to_json(invoice)?)).await?;
        let data = decode_field(&raw, "invoice")?;
        Ok(Fetched { data, raw })
    }

    /// `POST /v1/contacts/{id}/email`.
    pub async fn email_contact(
        &self,
        contact_id: &str,
        email: &ContactEmail<'_>,
    ) -> Result<serde_json::Value, ApiError> {
        self.send(
            Method::Post,
            &format!("/v1/contacts/{contact_id}/email"),
            Some(to_json(email)?),
        )
        .await
    }

    /// `GET /v1/organizations/{org_id}`: the `organization` object.
    pub async fn get_organization(&self) -> Result<Fetched<Option<serde_json::Value>>, ApiError> {
        let raw = self.send(Method::Get, &self.organization_path()?, None).await?;
        let data = raw.get("organization").filter(|o| !o.is_null()).cloned();
        Ok(Fetched { data, raw })
    }

    /// `PUT /v1/organizations/{org_id}`.
    pub async fn update_organization(
        &self,
        update: serde_json::Value,
    ) -> Result<Fetched<Option<serde_json::Value>>, ApiError> {
        let raw = self
            .send(Method::Put, &self.organization_path()?, Some(update))
            .await?;
        let data = raw.get("organization").filter(|o| !o.is_null()).cloned();
        Ok(Fetched { data, raw })
    }

    fn organization_path(&self) -> Result<String, ApiError> {
        let inventory = self
            .profile
            .inventory_with_org()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(format!("/v1/organizations/{}", inventory.org_id))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        self.gateway
            .call(method, path, body.as_ref(), self.profile)
            .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Configuration(format!("Invalid request body: {e}")))
}

fn decode<T: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
    raw: &serde_json::Value,
) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::UnexpectedResponse {
        message: format!("Malformed {what} in response: {e}"),
        body: raw.clone(),
    })
}

fn decode_field<T: DeserializeOwned>(raw: &serde_json::Value, field: &str) -> Result<T, ApiError> {
    match raw.get(field) {
        Some(value) if !value.is_null() => decode(value.clone(), field, raw),
        _ => Err(ApiError::UnexpectedResponse {
            message: format!("Response did not include a {field}"),
            body: raw.clone(),
        }),
    }
}
