//! [`Gateway`] implementation over HTTPS using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use invoicer_core::profile::Profile;

use crate::gateway::{ApiError, Gateway, Method};

/// Default base URL of the inventory API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.zohoapis.com/inventory";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the inventory API, shared by every job.
///
/// Each call is addressed with the profile's organization id and
/// authenticated with its access token. A profile may override the base URL.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a gateway with its own connection pool.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Build a gateway reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the full request URL for `path`.
    fn url_for(&self, path: &str, profile: &Profile) -> Result<String, ApiError> {
        let inventory = profile
            .inventory()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        let base = inventory
            .api_base_url
            .as_deref()
            .unwrap_or(&self.base_url)
            .trim_end_matches('/');
        Ok(format!("{base}{path}"))
    }

    /// Turn a response into JSON, classifying error statuses and
    /// application-level error codes.
    async fn classify(response: reqwest::Response) -> Result<serde_json::Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        let code = body.get("code").and_then(serde_json::Value::as_i64);
        if status.is_success() && code.unwrap_or(0) == 0 {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
            body: (!body.is_null()).then_some(body),
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        profile: &Profile,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.url_for(path, profile)?;
        let (org_id, token) = profile
            .inventory
            .as_ref()
            .map(|i| (i.org_id.as_str(), i.access_token.as_str()))
            .unwrap_or_default();

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
        }
        .query(&[("organization_id", org_id)])
        .header(
            reqwest::header::AUTHORIZATION,
            format!("Zoho-oauthtoken {token}"),
        );
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = method.as_str(), path, profile = %profile.profile_name, "Inventory API call");

        let result = Self::classify(request.send().await?).await;
        if let Err(e) = &result {
            tracing::warn!(method = method.as_str(), path, error = %e, "Inventory API call failed");
        }
        result
    }
}
