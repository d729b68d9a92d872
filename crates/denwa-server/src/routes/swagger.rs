//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use crate::models::{
    // Call models
    CallDetailResponse,
    CallFailedResponse,
    CallListResponse,
    CallSummary,
    // Phone number models
    ImportPhoneNumberRequest,
    InitiateCallRequest,
    InitiateCallResponse,
    InitiateWebCallRequest,
    PhoneNumberListResponse,
    PhoneNumberResponse,
    StatusResponse,
    WebCallResponse,
    // Webhook models
    WebhookAck,
    WebhookEnvelope,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Call endpoints
        super::call::initiate_call,
        super::call::list_calls,
        super::call::get_call,
        super::web_call::initiate_web_call,
        // Webhook endpoints
        super::webhook::ingest_webhook,
        // Phone number endpoints
        super::phone_number::import_phone_number,
        super::phone_number::list_phone_numbers,
        super::phone_number::remove_phone_number,
    ),
    info(
        title = "Denwa API",
        version = "0.1.0",
        description = "Outbound AI voice calls through Retell, with call lifecycle tracking reconciled from provider webhooks.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Call", description = "Call - Outbound phone and web calls"),
        (name = "Webhook", description = "Webhook - Provider call events"),
        (name = "PhoneNumber", description = "PhoneNumber - SIP trunk numbers on the provider"),
    ),
    components(
        schemas(
            // Call
            InitiateCallRequest,
            InitiateCallResponse,
            CallFailedResponse,
            InitiateWebCallRequest,
            WebCallResponse,
            CallSummary,
            CallListResponse,
            CallDetailResponse,
            // Webhook
            WebhookEnvelope,
            WebhookAck,
            // Phone number
            ImportPhoneNumberRequest,
            PhoneNumberResponse,
            PhoneNumberListResponse,
            StatusResponse,
        )
    )
)]
pub struct ApiDoc;
