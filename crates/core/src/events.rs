//! Progress and terminal events emitted by bulk jobs.
//!
//! Event names are the wire names the browser client listens for; the
//! payloads serialize in camelCase to match it.

use serde::{Deserialize, Serialize};

use crate::job::JobKind;

// ---------------------------------------------------------------------------
// Wire event names
// ---------------------------------------------------------------------------

/// Per-row progress update.
pub const EVENT_INVOICE_RESULT: &str = "invoiceResult";

/// Job drained every item (or stopped for a reason other than `end`).
pub const EVENT_BULK_COMPLETE: &str = "bulkComplete";

/// Job was ended by an operator.
pub const EVENT_BULK_ENDED: &str = "bulkEnded";

/// Job aborted on a critical error before draining.
pub const EVENT_BULK_ERROR: &str = "bulkError";

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

/// Pipeline stage a progress event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Contact,
    Invoice,
    Complete,
}

/// Outcome of one external call, attached to progress events so the client
/// can render the raw response on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_response: Option<serde_json::Value>,
}

impl StageResponse {
    pub fn ok(full_response: serde_json::Value) -> Self {
        Self {
            success: true,
            full_response: Some(full_response),
        }
    }

    pub fn failed(full_response: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            full_response,
        }
    }
}

/// Progress of one input row through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based position of the item in the input list.
    pub row_number: usize,
    pub email: String,
    pub stage: Stage,
    /// Only set on `complete` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_response: Option<StageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_response: Option<StageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_response: Option<StageResponse>,
    pub profile_name: String,
}

impl ProgressEvent {
    /// Create an event with no outcome and no attached responses.
    pub fn new(
        row_number: usize,
        email: impl Into<String>,
        stage: Stage,
        details: impl Into<String>,
        profile_name: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            email: email.into(),
            stage,
            success: None,
            details: details.into(),
            invoice_number: None,
            contact_response: None,
            invoice_response: None,
            email_response: None,
            profile_name: profile_name.into(),
        }
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_invoice_number(mut self, invoice_number: Option<String>) -> Self {
        self.invoice_number = invoice_number;
        self
    }

    pub fn with_contact_response(mut self, response: StageResponse) -> Self {
        self.contact_response = Some(response);
        self
    }

    pub fn with_invoice_response(mut self, response: StageResponse) -> Self {
        self.invoice_response = Some(response);
        self
    }

    pub fn with_email_response(mut self, response: StageResponse) -> Self {
        self.email_response = Some(response);
        self
    }
}

// ---------------------------------------------------------------------------
// TerminalEvent
// ---------------------------------------------------------------------------

/// How a job finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    Completed,
    Ended,
    CriticalError { message: String },
}

/// The single closing event of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalEvent {
    pub profile_name: String,
    pub job_type: JobKind,
    pub outcome: TerminalOutcome,
}

impl TerminalEvent {
    pub fn event_name(&self) -> &'static str {
        match self.outcome {
            TerminalOutcome::Completed => EVENT_BULK_COMPLETE,
            TerminalOutcome::Ended => EVENT_BULK_ENDED,
            TerminalOutcome::CriticalError { .. } => EVENT_BULK_ERROR,
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "profileName": self.profile_name,
            "jobType": self.job_type,
        });
        if let TerminalOutcome::CriticalError { message } = &self.outcome {
            payload["message"] = serde_json::Value::String(message.clone());
        }
        payload
    }
}

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// Anything a job emits toward its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Terminal(TerminalEvent),
}

impl JobEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            JobEvent::Progress(_) => EVENT_INVOICE_RESULT,
            JobEvent::Terminal(t) => t.event_name(),
        }
    }

    /// `{ "event": <name>, "payload": {...} }` envelope sent to clients.
    pub fn to_wire(&self) -> serde_json::Value {
        let payload = match self {
            JobEvent::Progress(p) => serde_json::to_value(p).unwrap_or_default(),
            JobEvent::Terminal(t) => t.payload(),
        };
        serde_json::json!({
            "event": self.event_name(),
            "payload": payload,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
