//! Phone Number DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use denwa::{DomainError, PhoneNumber, PhoneNumberImport, SipTransport};

/// Request to import a number through a SIP trunk
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportPhoneNumberRequest {
    /// E.164 format, e.g. +15551234567
    pub phone_number: String,
    /// SIP trunk termination URI, e.g. `trunk-id.sip.example.net`
    pub termination_uri: String,
    pub sip_trunk_auth_username: Option<String>,
    pub sip_trunk_auth_password: Option<String>,
    /// Defaults to the configured agent
    pub inbound_agent_id: Option<String>,
    /// Defaults to the configured agent
    pub outbound_agent_id: Option<String>,
    pub nickname: Option<String>,
    /// `TCP` (default), `UDP` or `TLS`
    pub transport: Option<String>,
}

impl TryFrom<ImportPhoneNumberRequest> for PhoneNumberImport {
    type Error = DomainError;

    fn try_from(request: ImportPhoneNumberRequest) -> Result<Self, Self::Error> {
        let transport = match request.transport.as_deref().map(str::trim) {
            None | Some("") => SipTransport::default(),
            Some(value) => value.parse().map_err(DomainError::Validation)?,
        };

        Ok(Self {
            phone_number: request.phone_number,
            termination_uri: request.termination_uri,
            sip_trunk_auth_username: request.sip_trunk_auth_username,
            sip_trunk_auth_password: request.sip_trunk_auth_password,
            inbound_agent_id: request.inbound_agent_id,
            outbound_agent_id: request.outbound_agent_id,
            nickname: request.nickname,
            transport,
        })
    }
}

/// Phone number registered with the provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhoneNumberResponse {
    pub phone_number: String,
    pub nickname: Option<String>,
    pub phone_number_type: Option<String>,
    pub inbound_agent_id: Option<String>,
    pub outbound_agent_id: Option<String>,
}

impl From<PhoneNumber> for PhoneNumberResponse {
    fn from(number: PhoneNumber) -> Self {
        Self {
            phone_number: number.phone_number,
            nickname: number.nickname,
            phone_number_type: number.phone_number_type,
            inbound_agent_id: number.inbound_agent_id,
            outbound_agent_id: number.outbound_agent_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PhoneNumberListResponse {
    pub count: usize,
    pub phone_numbers: Vec<PhoneNumberResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
