//! One-off invoice for a single recipient.
//!
//! Unlike the bulk pipeline this runs without a registry entry or progress
//! events: it resolves the profile by name, runs every step, and reports
//! one outcome carrying each step's raw response.

use async_trait::async_trait;
use invoicer_core::error::CoreError;
use invoicer_core::profile::{find_profile, Profile};
use invoicer_core::recipient::contact_name_from_email;
use invoicer_inventory::client::{
    ContactEmail, InventoryClient, InvoiceContacts, LineItem, NewInvoice,
};
use invoicer_inventory::gateway::{ApiError, Gateway};
use serde::{Deserialize, Serialize};

const MSG_MISSING_FIELDS: &str = "Missing required fields.";
const MSG_PROFILE_NOT_CONFIGURED: &str = "Inventory profile not configured.";
const MSG_NO_CONTACT_PERSON: &str = "Could not find a contact person for the contact.";

/// Source of named profiles, in configured order.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Profile>, CoreError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleInvoiceRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub selected_profile_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleInvoiceOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_response: Option<serde_json::Value>,
}

impl SingleInvoiceOutcome {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            full_response: None,
        }
    }
}

/// Line item used for one-off invoices.
fn single_line_item() -> LineItem {
    LineItem {
        name: "Service".to_string(),
        description: Some("General service provided".to_string()),
        rate: 0.00,
        quantity: 1,
    }
}

/// Create and send one invoice.
pub async fn send_single_invoice(
    gateway: &dyn Gateway,
    profiles: &dyn ProfileSource,
    request: &SingleInvoiceRequest,
) -> SingleInvoiceOutcome {
    if [
        &request.email,
        &request.subject,
        &request.body,
        &request.selected_profile_name,
    ]
    .iter()
    .any(|field| field.trim().is_empty())
    {
        return SingleInvoiceOutcome::rejected(MSG_MISSING_FIELDS);
    }

    let loaded = match profiles.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load profiles");
            return SingleInvoiceOutcome::rejected(e.to_string());
        }
    };
    let Some(profile) = find_profile(&loaded, &request.selected_profile_name)
        .filter(|p| p.inventory.is_some())
    else {
        return SingleInvoiceOutcome::rejected(MSG_PROFILE_NOT_CONFIGURED);
    };

    let client = InventoryClient::new(gateway, profile);
    let email = request.email.trim();
    let mut full_response = serde_json::Map::new();

    match run_steps(&client, email, request, &mut full_response).await {
        Ok(invoice_number) => {
            tracing::info!(email, invoice_number = %invoice_number, "Single invoice sent");
            SingleInvoiceOutcome {
                success: true,
                message: Some(format!(
                    "Invoice {invoice_number} created and email sent successfully."
                )),
                error: None,
                full_response: Some(full_response.into()),
            }
        }
        Err(e) => {
            tracing::warn!(email, error = %e, "Single invoice failed");
            full_response.insert(
                "error".to_string(),
                e.full_response().unwrap_or(serde_json::Value::Null),
            );
            SingleInvoiceOutcome {
                success: false,
                message: None,
                error: Some(e.message()),
                full_response: Some(full_response.into()),
            }
        }
    }
}

/// Contact, contact persons, invoice, email. Returns the invoice number.
async fn run_steps(
    client: &InventoryClient<'_>,
    email: &str,
    request: &SingleInvoiceRequest,
    full_response: &mut serde_json::Map<String, serde_json::Value>,
) -> Result<String, ApiError> {
    let found = client.find_contact_by_email(email).await?;
    let contact_id = match found.data {
        Some(contact) => {
            full_response.insert(
                "contact".to_string(),
                serde_json::json!({ "status": "found", "data": found.raw }),
            );
            contact.contact_id
        }
        None => {
            let created = client
                .create_contact(contact_name_from_email(email), email)
                .await?;
            full_response.insert(
                "contact".to_string(),
                serde_json::json!({ "status": "created", "data": created.raw }),
            );
            created.data.contact_id
        }
    };

    let details = client.get_contact(&contact_id).await?;
    let contact_person_ids = details.data.contact_person_ids();
    if contact_person_ids.is_empty() {
        return Err(ApiError::UnexpectedResponse {
            message: MSG_NO_CONTACT_PERSON.to_string(),
            body: details.raw,
        });
    }

    let line_items = [single_line_item()];
    let invoice = client
        .create_invoice(&NewInvoice {
            customer_id: &contact_id,
            contacts: InvoiceContacts::ContactPersonIds(&contact_person_ids),
            line_items: &line_items,
        })
        .await?;
    full_response.insert("invoice".to_string(), invoice.raw);

    let sent = client
        .email_contact(
            &contact_id,
            &ContactEmail {
                to_mail_ids: vec![email],
                subject: &request.subject,
                body: &request.body,
                send_from_org_email_id: Some(false),
            },
        )
        .await?;
    full_response.insert("email".to_string(), sent);

    Ok(invoice.data.invoice_number.unwrap_or_default())
}
