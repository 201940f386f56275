use std::path::PathBuf;
use std::time::Duration;

use invoicer_inventory::http::DEFAULT_API_BASE_URL;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines (default).
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for running jobs to drain (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JSON file holding the named profiles.
    pub profiles_path: PathBuf,
    /// Base URL of the inventory API, unless a profile overrides it.
    pub inventory_api_url: String,
    /// Per-request timeout for inventory API calls in seconds (default: `30`).
    pub gateway_timeout_secs: u64,
    /// Wait between invoice creation and its email in milliseconds (default: `1000`).
    pub settle_delay_ms: u64,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                             |
    /// | `PORT`                 | `3000`                                |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`               |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                  |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                                  |
    /// | `PROFILES_PATH`        | `profiles.json`                       |
    /// | `INVENTORY_API_URL`    | `https://www.zohoapis.com/inventory`  |
    /// | `GATEWAY_TIMEOUT_SECS` | `30`                                  |
    /// | `SETTLE_DELAY_MS`      | `1000`                                |
    /// | `LOG_FORMAT`           | `pretty` (`json` for JSON lines)      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env_u64("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs = env_u64("SHUTDOWN_TIMEOUT_SECS", 30);

        let profiles_path = std::env::var("PROFILES_PATH")
            .unwrap_or_else(|_| "profiles.json".into())
            .into();

        let inventory_api_url =
            std::env::var("INVENTORY_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let gateway_timeout_secs = env_u64("GATEWAY_TIMEOUT_SECS", 30);
        let settle_delay_ms = env_u64("SETTLE_DELAY_MS", 1000);

        let log_format = LogFormat::parse(&std::env::var("LOG_FORMAT").unwrap_or_default());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            profiles_path,
            inventory_api_url,
            gateway_timeout_secs,
            settle_delay_ms,
            log_format,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}
