//! Server configuration
//!
//! Built once at startup from Shuttle secrets and injected into the
//! gateway, the lifecycle engine and the routes. Nothing reads the
//! environment after this point.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_RETELL_API_BASE_URL: &str = "https://api.retellai.com";
pub const DEFAULT_WEBHOOK_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ORPHAN_RETENTION_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the calling provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base_url: String,
    /// Agent used when a request does not name one
    pub default_agent_id: Option<String>,
    /// Caller ID used when a request does not name one
    pub default_from_number: Option<String>,
    /// Destination used when a request does not name one
    pub default_to_number: Option<String>,
    pub request_timeout: Duration,
}

/// Settings for inbound provider webhooks
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Key for `x-retell-signature` verification; `None` disables the check
    pub signing_key: Option<String>,
    /// Public base URL the provider posts to (reported by `/config/check`)
    pub public_base_url: String,
    /// How long events for unknown calls are kept for late correlation
    pub orphan_retention: Duration,
}

/// Where call records live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallStore {
    #[default]
    Postgres,
    /// Process memory; records are lost on restart
    Memory,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub webhook: WebhookConfig,
    /// Bearer token for `/api/*`; `None` disables authentication
    pub api_key: Option<String>,
    pub store: CallStore,
    pub log_filter: String,
}

impl AppConfig {
    /// Build the configuration from a key lookup (Shuttle `SecretStore::get`
    /// in production, a map in tests). Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("RETELL_API_KEY").ok_or(ConfigError::Missing("RETELL_API_KEY"))?;

        let request_timeout = Duration::from_secs(parse_secs(
            "RETELL_TIMEOUT_SECS",
            get("RETELL_TIMEOUT_SECS"),
            DEFAULT_PROVIDER_TIMEOUT_SECS,
        )?);
        let orphan_retention = Duration::from_secs(parse_secs(
            "ORPHAN_RETENTION_SECS",
            get("ORPHAN_RETENTION_SECS"),
            DEFAULT_ORPHAN_RETENTION_SECS,
        )?);

        let store = match get("CALL_STORE").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("postgres") => CallStore::Postgres,
            Some("memory") => CallStore::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CALL_STORE",
                    value: other.to_string(),
                })
            }
        };

        let verify_webhooks = parse_flag(
            "WEBHOOK_VERIFY_SIGNATURE",
            get("WEBHOOK_VERIFY_SIGNATURE"),
            true,
        )?;
        let signing_key = verify_webhooks
            .then(|| get("RETELL_WEBHOOK_SECRET").unwrap_or_else(|| api_key.clone()));

        Ok(Self {
            provider: ProviderConfig {
                api_base_url: get("RETELL_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_RETELL_API_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                default_agent_id: get("RETELL_AGENT_ID"),
                default_from_number: get("RETELL_FROM_NUMBER"),
                default_to_number: get("RETELL_DEFAULT_TO_NUMBER"),
                request_timeout,
                api_key,
            },
            webhook: WebhookConfig {
                signing_key,
                public_base_url: get("WEBHOOK_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_WEBHOOK_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                orphan_retention,
            },
            api_key: get("DENWA_API_KEY"),
            store,
            log_filter: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_secs(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: value.unwrap_or_default(),
        }),
    }
}
