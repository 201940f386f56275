//! Shared fixtures for engine integration tests: a scripted in-memory
//! inventory service and an event-collecting sink.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use invoicer_core::events::{JobEvent, ProgressEvent, Stage, TerminalOutcome};
use invoicer_core::job::{JobId, JobKind};
use invoicer_core::profile::Profile;
use invoicer_engine::runner::BulkInvoiceJob;
use invoicer_engine::single::ProfileSource;
use invoicer_engine::{EventSink, InvoiceTemplate};
use invoicer_inventory::gateway::{ApiError, Gateway, Method};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// FakeGateway
// ---------------------------------------------------------------------------

/// Recorded external call.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub at: Instant,
}

/// Scripted inventory service.
///
/// By default every lookup finds nothing, contact creation succeeds with id
/// `new-<local part>`, invoices are numbered `INV-00001`, `INV-00002`, ...
/// and emails succeed.
#[derive(Default)]
pub struct FakeGateway {
    existing: HashMap<String, (String, Vec<String>)>,
    failing_lookups: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_invoices: HashSet<String>,
    failing_emails: HashSet<String>,
    panicking_lookups: HashSet<String>,
    contact_persons: HashMap<String, Vec<String>>,
    latency: Duration,
    invoices: Mutex<u32>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// `email` already exists as `contact_id` with the given persons.
    pub fn with_existing(mut self, email: &str, contact_id: &str, persons: &[&str]) -> Self {
        self.existing.insert(
            email.to_string(),
            (
                contact_id.to_string(),
                persons.iter().map(|p| p.to_string()).collect(),
            ),
        );
        self
    }

    pub fn failing_lookup(mut self, email: &str) -> Self {
        self.failing_lookups.insert(email.to_string());
        self
    }

    pub fn failing_create(mut self, email: &str) -> Self {
        self.failing_creates.insert(email.to_string());
        self
    }

    /// Invoice creation fails for this customer id.
    pub fn failing_invoice(mut self, contact_id: &str) -> Self {
        self.failing_invoices.insert(contact_id.to_string());
        self
    }

    /// Email sending fails for this contact id.
    pub fn failing_email(mut self, contact_id: &str) -> Self {
        self.failing_emails.insert(contact_id.to_string());
        self
    }

    pub fn panicking_lookup(mut self, email: &str) -> Self {
        self.panicking_lookups.insert(email.to_string());
        self
    }

    /// Persons returned by `GET /v1/contacts/{id}`.
    pub fn with_contact_persons(mut self, contact_id: &str, persons: &[&str]) -> Self {
        self.contact_persons.insert(
            contact_id.to_string(),
            persons.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Every call takes this long.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    fn error(status: u16, message: &str) -> ApiError {
        ApiError::Api {
            status,
            message: message.to_string(),
            body: Some(serde_json::json!({ "code": status, "message": message })),
        }
    }

    fn persons_json(persons: &[String]) -> serde_json::Value {
        persons
            .iter()
            .map(|p| serde_json::json!({ "contact_person_id": p }))
            .collect()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        _profile: &Profile,
    ) -> Result<serde_json::Value, ApiError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
            at: Instant::now(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let segments: Vec<&str> = path.trim_start_matches("/v1/").split('/').collect();
        match (method, segments.as_slice()) {
            (Method::Get, [query]) if query.starts_with("contacts?email=") => {
                let encoded = query.trim_start_matches("contacts?email=");
                let email = urlencoding::decode(encoded)
                    .map(|e| e.into_owned())
                    .unwrap_or_else(|_| encoded.to_string());
                if self.panicking_lookups.contains(&email) {
                    panic!("lookup exploded for {email}");
                }
                if self.failing_lookups.contains(&email) {
                    return Err(ApiError::Configuration("network unreachable".to_string()));
                }
                match self.existing.get(&email) {
                    Some((id, persons)) => Ok(serde_json::json!({
                        "code": 0,
                        "contacts": [{ "contact_id": id, "contact_persons": Self::persons_json(persons) }]
                    })),
                    None => Ok(serde_json::json!({ "code": 0, "contacts": [] })),
                }
            }
            (Method::Post, ["contacts"]) => {
                let body = body.cloned().unwrap_or_default();
                let email = body["contact_persons"][0]["email"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                if self.failing_creates.contains(&email) {
                    return Err(Self::error(400, "Contact could not be created"));
                }
                let name = body["contact_name"].as_str().unwrap_or_default();
                let id = format!("new-{name}");
                Ok(serde_json::json!({
                    "code": 0,
                    "contact": {
                        "contact_id": id,
                        "contact_persons": [{ "contact_person_id": format!("{id}-p") }]
                    }
                }))
            }
            (Method::Get, ["contacts", id]) => {
                let persons = self.contact_persons.get(*id).cloned().unwrap_or_default();
                Ok(serde_json::json!({
                    "code": 0,
                    "contact": { "contact_id": id, "contact_persons": Self::persons_json(&persons) }
                }))
            }
            (Method::Post, ["invoices"]) => {
                let customer = body
                    .and_then(|b| b["customer_id"].as_str())
                    .unwrap_or_default()
                    .to_string();
                if self.failing_invoices.contains(&customer) {
                    return Err(Self::error(400, "Invalid line item"));
                }
                let mut counter = self.invoices.lock().unwrap();
                *counter += 1;
                Ok(serde_json::json!({
                    "code": 0,
                    "invoice": {
                        "invoice_id": format!("inv-{counter}"),
                        "invoice_number": format!("INV-{:05}", *counter),
                    }
                }))
            }
            (Method::Post, ["contacts", id, "email"]) => {
                if self.failing_emails.contains(*id) {
                    return Err(Self::error(500, "Mail server rejected the message"));
                }
                Ok(serde_json::json!({ "code": 0, "message": "Your message has been sent." }))
            }
            _ => Err(Self::error(404, "Unknown endpoint")),
        }
    }
}

// ---------------------------------------------------------------------------
// CollectingSink
// ---------------------------------------------------------------------------

/// Sink that records every event with the (virtual) time it arrived.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<(Instant, JobEvent)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<JobEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, JobEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                JobEvent::Progress(p) => Some(p),
                JobEvent::Terminal(_) => None,
            })
            .collect()
    }

    pub fn terminals(&self) -> Vec<TerminalOutcome> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                JobEvent::Terminal(t) => Some(t.outcome),
                JobEvent::Progress(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventSink for CollectingSink {
    async fn emit(&self, event: JobEvent) {
        self.events.lock().unwrap().push((Instant::now(), event));
    }
}

// ---------------------------------------------------------------------------
// Profiles and jobs
// ---------------------------------------------------------------------------

pub fn profile() -> Profile {
    serde_json::from_value(serde_json::json!({
        "profileName": "Acme",
        "inventory": { "orgId": "600", "accessToken": "tok" }
    }))
    .unwrap()
}

pub struct StaticProfiles(pub Vec<Profile>);

#[async_trait]
impl ProfileSource for StaticProfiles {
    async fn load(&self) -> Result<Vec<Profile>, invoicer_core::error::CoreError> {
        Ok(self.0.clone())
    }
}

pub fn job_id(conn: &str) -> JobId {
    JobId::new(conn, "Acme", JobKind::Invoice)
}

/// Job over `emails` with no settle delay and the given inter-item delay.
pub fn job(conn: &str, emails: &[&str], delay: Duration) -> BulkInvoiceJob {
    BulkInvoiceJob {
        job_id: job_id(conn),
        profile_name: "Acme".to_string(),
        profile: Ok(profile()),
        emails: emails.iter().map(|e| e.to_string()).collect(),
        template: InvoiceTemplate::new("Your invoice", "Please find your invoice attached.")
            .with_settle_delay(Duration::ZERO),
        inter_item_delay: delay,
    }
}

/// `(row, stage, success)` triples for compact assertions.
pub fn stages(events: &[ProgressEvent]) -> Vec<(usize, Stage, Option<bool>)> {
    events
        .iter()
        .map(|e| (e.row_number, e.stage, e.success))
        .collect()
}
