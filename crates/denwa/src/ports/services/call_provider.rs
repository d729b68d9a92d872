//! Call Provider Port
//!
//! Narrow capability interface over the conversational-AI telephony
//! provider. The lifecycle engine only ever sees these types; provider
//! SDK shapes stay inside the adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Outbound phone call to place
#[derive(Debug, Clone, Default)]
pub struct PhoneCallRequest {
    /// Destination in E.164 format
    pub to_number: String,
    /// Caller ID in E.164 format
    pub from_number: String,
    /// Provider agent that runs the conversation
    pub agent_id: String,
    /// Stored on the provider's call object, returned in webhooks
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Values injected into the agent prompt at runtime
    pub dynamic_variables: HashMap<String, String>,
}

/// Provider acknowledgement of a placed phone call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub remote_call_id: String,
    /// Provider-native status string (e.g. "registered"), informational only
    pub provider_status: Option<String>,
}

/// Browser-based test call to create
#[derive(Debug, Clone, Default)]
pub struct WebCallRequest {
    pub agent_id: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub dynamic_variables: HashMap<String, String>,
}

/// Provider acknowledgement of a web call; token and URL are passed through verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWebCall {
    pub remote_call_id: String,
    pub access_token: String,
    pub test_url: String,
}

/// SIP transport used between the provider and a custom trunk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SipTransport {
    #[default]
    Tcp,
    Udp,
    Tls,
}

impl std::fmt::Display for SipTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SipTransport::Tcp => write!(f, "TCP"),
            SipTransport::Udp => write!(f, "UDP"),
            SipTransport::Tls => write!(f, "TLS"),
        }
    }
}

impl std::str::FromStr for SipTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TCP" => Ok(SipTransport::Tcp),
            "UDP" => Ok(SipTransport::Udp),
            "TLS" => Ok(SipTransport::Tls),
            _ => Err(format!("Unknown SIP transport: {}", s)),
        }
    }
}

/// Phone number to bind to the provider through a SIP trunk
#[derive(Debug, Clone, Default)]
pub struct PhoneNumberImport {
    pub phone_number: String,
    /// Trunk termination URI, e.g. `trunk-id.sip.example.net`
    pub termination_uri: String,
    pub sip_trunk_auth_username: Option<String>,
    pub sip_trunk_auth_password: Option<String>,
    pub inbound_agent_id: Option<String>,
    pub outbound_agent_id: Option<String>,
    pub nickname: Option<String>,
    pub transport: SipTransport,
}

/// Phone number registered with the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhoneNumber {
    pub phone_number: String,
    pub nickname: Option<String>,
    pub phone_number_type: Option<String>,
    pub inbound_agent_id: Option<String>,
    pub outbound_agent_id: Option<String>,
}

/// Capability interface of the calling provider
///
/// Every failure is reported as `DomainError::Provider`.
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Place an outbound phone call
    async fn place_call(&self, request: PhoneCallRequest) -> Result<PlacedCall, DomainError>;

    /// Create a browser test call session
    async fn place_web_call(&self, request: WebCallRequest)
        -> Result<PlacedWebCall, DomainError>;

    /// Import a phone number (SIP trunk binding)
    async fn import_number(&self, request: PhoneNumberImport)
        -> Result<PhoneNumber, DomainError>;

    /// List phone numbers registered with the provider
    async fn list_numbers(&self) -> Result<Vec<PhoneNumber>, DomainError>;

    /// Remove a phone number from the provider (the number itself stays with the carrier)
    async fn remove_number(&self, phone_number: &str) -> Result<(), DomainError>;
}
