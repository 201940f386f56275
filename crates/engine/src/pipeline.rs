//! Per-item pipeline: contact → invoice → notification.
//!
//! One pass handles one recipient. The pass stops at the first failing
//! stage and reports it as a `complete` event with `success: false`; it
//! never returns an error to the runner. Events for a row are emitted in
//! stage order and each stage is reported at most once:
//!
//! ```text
//! contact  "Searching for contact..."            before the lookup
//! invoice  "Contact processed. Creating invoice..." once the contact is resolved
//! complete success true/false                     after the last attempted stage
//! ```

use std::time::Duration;

use invoicer_core::events::{JobEvent, ProgressEvent, Stage, StageResponse};
use invoicer_core::job::JobId;
use invoicer_core::recipient::contact_name_from_email;
use invoicer_inventory::client::{
    ContactEmail, InventoryClient, InvoiceContacts, LineItem, NewInvoice,
};
use invoicer_inventory::gateway::ApiError;

use crate::delay::interruptible_delay;
use crate::registry::JobRegistry;
use crate::sink::EventSink;

/// Default wait between invoice creation and the notification email, so the
/// service has indexed the new invoice.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Caller-supplied content for every item of a job.
#[derive(Debug, Clone)]
pub struct InvoiceTemplate {
    pub subject: String,
    pub body: String,
    pub line_items: Vec<LineItem>,
    pub settle_delay: Duration,
}

impl InvoiceTemplate {
    /// Template with the placeholder line item and default settle delay.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            line_items: vec![LineItem::default()],
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_line_items(mut self, line_items: Vec<LineItem>) -> Self {
        if !line_items.is_empty() {
            self.line_items = line_items;
        }
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

/// Where one pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Sent { invoice_number: Option<String> },
    ContactFailed,
    InvoiceFailed,
    NotificationFailed { invoice_number: Option<String> },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Sent { .. })
    }
}

/// Contact resolved for one recipient.
struct ResolvedContact {
    contact_id: String,
    contact_person_ids: Vec<String>,
    raw: serde_json::Value,
}

/// Runs the three stages for the items of one job.
pub struct InvoicePipeline<'a> {
    client: InventoryClient<'a>,
    sink: &'a dyn EventSink,
    registry: &'a JobRegistry,
    job_id: &'a JobId,
    template: &'a InvoiceTemplate,
    profile_name: &'a str,
}

impl<'a> InvoicePipeline<'a> {
    pub fn new(
        client: InventoryClient<'a>,
        sink: &'a dyn EventSink,
        registry: &'a JobRegistry,
        job_id: &'a JobId,
        template: &'a InvoiceTemplate,
    ) -> Self {
        let profile_name = client.profile().profile_name.as_str();
        Self {
            client,
            sink,
            registry,
            job_id,
            template,
            profile_name,
        }
    }

    /// Process one recipient. `row_number` is 1-based.
    pub async fn process(&self, row_number: usize, email: &str) -> ItemOutcome {
        self.emit(self.event(row_number, email, Stage::Contact, "Searching for contact..."))
            .await;

        // -- Stage 1: contact -------------------------------------------------
        let contact = match self.resolve_contact(row_number, email).await {
            Ok(contact) => contact,
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, row = row_number, email, error = %e, "Contact stage failed");
                let event = self
                    .event(row_number, email, Stage::Complete, format!("Contact Error: {}", e.message()))
                    .with_success(false)
                    .with_contact_response(StageResponse::failed(e.full_response()));
                self.emit(event).await;
                return ItemOutcome::ContactFailed;
            }
        };
        let contact_response = StageResponse::ok(contact.raw);
        self.emit(
            self.event(row_number, email, Stage::Invoice, "Contact processed. Creating invoice...")
                .with_contact_response(contact_response.clone()),
        )
        .await;

        // -- Stage 2: invoice -------------------------------------------------
        let request = NewInvoice {
            customer_id: &contact.contact_id,
            contacts: InvoiceContacts::ContactPersons(&contact.contact_person_ids),
            line_items: &self.template.line_items,
        };
        let invoice = match self.client.create_invoice(&request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, row = row_number, email, error = %e, "Invoice stage failed");
                let event = self
                    .event(
                        row_number,
                        email,
                        Stage::Complete,
                        format!("Invoice Creation Error: {}", e.message()),
                    )
                    .with_success(false)
                    .with_contact_response(contact_response)
                    .with_invoice_response(StageResponse::failed(e.full_response()));
                self.emit(event).await;
                return ItemOutcome::InvoiceFailed;
            }
        };
        let invoice_number = invoice.data.invoice_number.clone();
        tracing::info!(
            job_id = %self.job_id,
            row = row_number,
            invoice_id = %invoice.data.invoice_id,
            invoice_number = ?invoice_number,
            "Invoice created",
        );
        let invoice_response = StageResponse::ok(invoice.raw);

        // -- Stage 3: notification --------------------------------------------
        interruptible_delay(self.registry, self.job_id, self.template.settle_delay).await;

        let message = ContactEmail {
            to_mail_ids: vec![email],
            subject: &self.template.subject,
            body: &self.template.body,
            send_from_org_email_id: None,
        };
        match self.client.email_contact(&contact.contact_id, &message).await {
            Ok(raw) => {
                let details = format!(
                    "Email sent for Invoice #{}.",
                    invoice_number.as_deref().unwrap_or_default()
                );
                let event = self
                    .event(row_number, email, Stage::Complete, details)
                    .with_success(true)
                    .with_invoice_number(invoice_number.clone())
                    .with_invoice_response(invoice_response)
                    .with_email_response(StageResponse::ok(raw));
                self.emit(event).await;
                ItemOutcome::Sent { invoice_number }
            }
            Err(e) => {
                // The invoice stays; the row still counts as processed.
                tracing::warn!(job_id = %self.job_id, row = row_number, email, error = %e, "Notification stage failed");
                let event = self
                    .event(row_number, email, Stage::Complete, format!("Email Send Error: {}", e.message()))
                    .with_success(false)
                    .with_invoice_number(invoice_number.clone())
                    .with_invoice_response(invoice_response)
                    .with_email_response(StageResponse::failed(e.full_response()));
                self.emit(event).await;
                ItemOutcome::NotificationFailed { invoice_number }
            }
        }
    }

    /// Find the contact by email, creating it when absent.
    async fn resolve_contact(&self, row_number: usize, email: &str) -> Result<ResolvedContact, ApiError> {
        let found = self.client.find_contact_by_email(email).await?;
        if let Some(contact) = found.data {
            tracing::debug!(job_id = %self.job_id, row = row_number, contact_id = %contact.contact_id, "Contact found");
            return Ok(ResolvedContact {
                contact_person_ids: contact.contact_person_ids(),
                contact_id: contact.contact_id,
                raw: found.raw,
            });
        }

        let created = self
            .client
            .create_contact(contact_name_from_email(email), email)
            .await?;
        tracing::info!(job_id = %self.job_id, row = row_number, contact_id = %created.data.contact_id, "Contact created");
        Ok(ResolvedContact {
            contact_person_ids: created.data.contact_person_ids(),
            contact_id: created.data.contact_id,
            raw: created.raw,
        })
    }

    fn event(
        &self,
        row_number: usize,
        email: &str,
        stage: Stage,
        details: impl Into<String>,
    ) -> ProgressEvent {
        ProgressEvent::new(row_number, email, stage, details, self.profile_name)
    }

    async fn emit(&self, event: ProgressEvent) {
        self.sink.emit(JobEvent::Progress(event)).await;
    }
}
