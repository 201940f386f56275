//! Job identity and control-state vocabulary.
//!
//! A bulk run is addressed by a [`JobId`] derived from the caller's
//! connection, the profile it runs against, and the [`JobKind`]. Control
//! requests rebuild the same id from the same triple, so no id has to be
//! handed back to the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// JobKind
// ---------------------------------------------------------------------------

/// Well-known job kind names. Sent to clients as `jobType`.
pub const JOB_KIND_INVOICE: &str = "invoice";

/// The kind of bulk work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Invoice,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Invoice => JOB_KIND_INVOICE,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            JOB_KIND_INVOICE => Ok(JobKind::Invoice),
            other => Err(CoreError::Validation(format!("Unknown job type: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Opaque registry key for one running job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Build the id for `(connection, profile, kind)`.
    ///
    /// Deterministic: the same triple always yields the same id.
    pub fn new(connection_id: &str, profile_name: &str, kind: JobKind) -> Self {
        Self(format!("{connection_id}_{profile_name}_{kind}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// JobStatus / ControlAction
// ---------------------------------------------------------------------------

/// Control state of a job as held by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Paused,
    Ended,
}

/// Operator request against a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Pause,
    Resume,
    End,
}

impl ControlAction {
    /// The status the registry entry moves to when this action is applied.
    pub fn target_status(&self) -> JobStatus {
        match self {
            ControlAction::Pause => JobStatus::Paused,
            ControlAction::Resume => JobStatus::Running,
            ControlAction::End => JobStatus::Ended,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
