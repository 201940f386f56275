//! The single-request seam to the external inventory API.
//!
//! Everything above this module talks to the service through [`Gateway`],
//! so the engine can be driven by an in-memory fake in tests and by
//! [`HttpGateway`](crate::http::HttpGateway) in production.

use async_trait::async_trait;
use invoicer_core::profile::Profile;

/// HTTP verbs used against the inventory API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// Errors from one external call.
///
/// Every variant can produce a short human-readable [`message`](Self::message)
/// and, where the service answered, the raw body via
/// [`full_response`](Self::full_response).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error status or a non-zero `code`.
    #[error("Inventory API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// The service answered successfully but the body lacks what we need.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        message: String,
        body: serde_json::Value,
    },

    /// The profile cannot be used to address the service.
    #[error("{0}")]
    Configuration(String),
}

impl ApiError {
    /// Short message suitable for a progress event's `details`.
    pub fn message(&self) -> String {
        match self {
            ApiError::Request(e) => e.to_string(),
            ApiError::Api { message, .. } => message.clone(),
            ApiError::UnexpectedResponse { message, .. } => message.clone(),
            ApiError::Configuration(message) => message.clone(),
        }
    }

    /// Raw diagnostic payload from the service, if one was received.
    pub fn full_response(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Api { body, .. } => body.clone(),
            ApiError::UnexpectedResponse { body, .. } => Some(body.clone()),
            ApiError::Request(_) | ApiError::Configuration(_) => None,
        }
    }
}

/// Performs a single authenticated request against the inventory service.
///
/// Implementations return the parsed JSON body on success and classify
/// every failure into an [`ApiError`].
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        profile: &Profile,
    ) -> Result<serde_json::Value, ApiError>;
}
