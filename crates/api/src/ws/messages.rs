//! Inbound WebSocket messages.
//!
//! Clients send the same `{ "event": <name>, "payload": {...} }` envelope
//! they receive. Outbound job events are built by
//! [`JobEvent::to_wire`](invoicer_core::events::JobEvent::to_wire).

use std::time::Duration;

use invoicer_core::job::{ControlAction, JobKind};
use invoicer_core::profile::Profile;
use invoicer_inventory::LineItem;
use serde::Deserialize;

/// Sent back when an inbound message cannot be acted on.
pub const EVENT_REQUEST_ERROR: &str = "requestError";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    StartBulkInvoice(StartBulkInvoice),
    JobControl(JobControl),
}

/// Start a bulk invoice run for this connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBulkInvoice {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    /// Seconds to wait between items.
    #[serde(default)]
    pub delay: f64,
    pub selected_profile_name: String,
    /// Inline profile; when absent the profile is looked up by name.
    #[serde(default)]
    pub active_profile: Option<Profile>,
    /// Invoice lines; empty means the placeholder line.
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl StartBulkInvoice {
    /// The inter-item delay. Negative or non-finite values mean none.
    pub fn inter_item_delay(&self) -> Duration {
        if self.delay > 0.0 {
            Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }
}

/// Pause, resume or end a job this connection started.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobControl {
    pub profile_name: String,
    pub job_type: JobKind,
    pub action: ControlAction,
}

/// `requestError` envelope with a message.
pub fn request_error(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "event": EVENT_REQUEST_ERROR,
        "payload": { "message": message.into() },
    })
}
