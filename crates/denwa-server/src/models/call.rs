//! Call DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use denwa::CallRecord;

use crate::application::{InitiateCall, InitiateWebCall, WebCallSession};

/// Request to place an outbound phone call
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct InitiateCallRequest {
    /// Destination in E.164 format; falls back to the configured default
    pub to_number: Option<String>,
    /// Caller ID in E.164 format; falls back to the configured default
    pub from_number: Option<String>,
    pub lead_name: Option<String>,
    pub lead_id: Option<String>,
    /// Agent override; falls back to the configured default
    pub agent_id: Option<String>,
    /// Stored on the provider's call object
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<InitiateCallRequest> for InitiateCall {
    fn from(request: InitiateCallRequest) -> Self {
        Self {
            to_number: request.to_number,
            from_number: request.from_number,
            lead_id: request.lead_id,
            lead_name: request.lead_name,
            agent_id: request.agent_id,
            metadata: request.metadata.unwrap_or_default(),
        }
    }
}

/// Call placed with the provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InitiateCallResponse {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub status: String,
}

impl From<&CallRecord> for InitiateCallResponse {
    fn from(record: &CallRecord) -> Self {
        Self {
            id: record.id,
            remote_call_id: record.remote_call_id.clone(),
            status: record.status.to_string(),
        }
    }
}

/// The provider rejected the call; the record is kept as `failed`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallFailedResponse {
    pub id: Uuid,
    pub status: String,
    pub error: String,
}

/// Request to open a browser test call
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct InitiateWebCallRequest {
    pub lead_name: Option<String>,
    pub agent_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl From<InitiateWebCallRequest> for InitiateWebCall {
    fn from(request: InitiateWebCallRequest) -> Self {
        Self {
            lead_name: request.lead_name,
            agent_id: request.agent_id,
            metadata: request.metadata.unwrap_or_default(),
        }
    }
}

/// Web call session details for the browser client
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebCallResponse {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    /// Token for the provider's web client SDK
    pub access_token: String,
    /// Provider dashboard page for talking to the agent
    pub test_url: String,
}

impl From<WebCallSession> for WebCallResponse {
    fn from(session: WebCallSession) -> Self {
        Self {
            id: session.record.id,
            remote_call_id: session.record.remote_call_id,
            access_token: session.access_token,
            test_url: session.test_url,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCallsQuery {
    /// Maximum number of calls to return
    pub limit: Option<i64>,
}

/// Call list entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallSummary {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_phone: Option<String>,
    pub kind: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub has_transcript: bool,
    pub has_summary: bool,
    pub recording_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CallRecord> for CallSummary {
    fn from(record: CallRecord) -> Self {
        Self {
            has_transcript: record.has_transcript(),
            has_summary: record.has_summary(),
            id: record.id,
            remote_call_id: record.remote_call_id,
            lead_name: record.lead_name,
            lead_phone: record.lead_phone,
            kind: record.kind.to_string(),
            status: record.status.to_string(),
            duration_ms: record.duration_ms,
            recording_url: record.recording_url,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallListResponse {
    pub total: usize,
    pub calls: Vec<CallSummary>,
}

/// Full call record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallDetailResponse {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_phone: Option<String>,
    pub kind: String,
    pub status: String,
    pub transcript: Option<String>,
    pub call_summary: Option<String>,
    pub recording_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub disconnection_reason: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CallRecord> for CallDetailResponse {
    fn from(record: CallRecord) -> Self {
        Self {
            id: record.id,
            remote_call_id: record.remote_call_id,
            lead_id: record.lead_id,
            lead_name: record.lead_name,
            lead_phone: record.lead_phone,
            kind: record.kind.to_string(),
            status: record.status.to_string(),
            transcript: record.transcript,
            call_summary: record.call_summary,
            recording_url: record.recording_url,
            duration_ms: record.duration_ms,
            disconnection_reason: record.disconnection_reason,
            error_detail: record.error_detail,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
