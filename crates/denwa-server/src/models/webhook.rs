//! Webhook DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement returned to the provider for every accepted delivery
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub ack: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { ack: true }
    }
}

/// Provider event envelope as documented in the API schema.
///
/// The handler parses the raw body leniently (it also accepts
/// `event_type` and `call.remote_call_id`).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookEnvelope {
    /// `call_started`, `call_ended`, `call_analyzed`; others are acknowledged and ignored
    pub event: String,
    /// Provider call object; must carry `call_id`
    #[schema(value_type = Object)]
    pub call: serde_json::Value,
}
