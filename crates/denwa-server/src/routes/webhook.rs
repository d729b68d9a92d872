//! Webhook Routes - Provider Lifecycle Events
//!
//! The provider posts call events here. Requests are authenticated by the
//! `x-retell-signature` header rather than the API key.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use crate::adapters::retell::webhook::{parse_event, verify_signature, SIGNATURE_HEADER};
use crate::application::WebhookOutcome;
use crate::models::{WebhookAck, WebhookEnvelope};
use crate::routes::{error_response, ApiError};
use crate::AppState;

/// Receive a provider call event
#[utoipa::path(
    post,
    path = "/webhook/retell",
    request_body = WebhookEnvelope,
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Malformed payload or missing call id"),
        (status = 401, description = "Invalid signature"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Webhook"
)]
pub async fn ingest_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    match &state.config.webhook.signing_key {
        Some(key) => {
            let signature = headers
                .get(SIGNATURE_HEADER)
                .and_then(|value| value.to_str().ok());
            if let Err(e) = verify_signature(key, &body, signature, Utc::now()) {
                tracing::warn!("Rejected webhook: {}", e);
                return Err((
                    StatusCode::UNAUTHORIZED,
                    format!("Invalid webhook signature: {e}"),
                ));
            }
        }
        None => tracing::debug!("Webhook signing key not configured, skipping verification"),
    }

    let event = parse_event(&body).map_err(|e| {
        tracing::warn!("Rejected webhook: {}", e);
        error_response(e)
    })?;

    tracing::info!(
        "Webhook | event={} | remote_call_id={}",
        event.kind,
        event.remote_call_id
    );

    let outcome = state
        .call_service
        .apply_webhook_event(event)
        .await
        .map_err(|e| {
            tracing::error!("Failed to apply webhook event: {}", e);
            error_response(e)
        })?;

    if let WebhookOutcome::Applied { record, changed } = outcome {
        tracing::debug!(
            "Call {} is {} (changed: {})",
            record.id,
            record.status,
            changed
        );
    }

    Ok(Json(WebhookAck::received()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook/retell", post(ingest_webhook))
        .route("/webhook-ingest", post(ingest_webhook))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::json;

    use crate::adapters::retell::webhook::sign;
    use crate::application::testing::FakeProvider;
    use crate::models::WebhookEnvelope;
    use crate::routes::testing::{config, json_request, send, setup_app, PROVIDER_KEY};
    use denwa::{CallRepository, CallStatus};

    fn signed(uri: &str, body: serde_json::Value, key: &str) -> Request<Body> {
        let bytes = body.to_string();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-retell-signature", sign(key, bytes.as_bytes(), Utc::now()))
            .body(Body::from(bytes))
            .unwrap()
    }

    fn event(name: &str, call: serde_json::Value) -> serde_json::Value {
        serde_json::to_value(WebhookEnvelope {
            event: name.to_string(),
            call,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_signed_events_drive_the_lifecycle() {
        let (app, repo) = setup_app(FakeProvider::new(), config(&[]));
        send(
            &app,
            json_request("POST", "/api/calls", json!({ "to_number": "+15551234567" })),
        )
        .await;

        for body in [
            event("call_started", json!({ "call_id": "rc_1" })),
            event(
                "call_ended",
                json!({ "call_id": "rc_1", "duration_ms": 4200, "transcript": "Agent: Hi" }),
            ),
            event(
                "call_analyzed",
                json!({ "call_id": "rc_1", "call_analysis": { "call_summary": "Booked demo" } }),
            ),
        ] {
            let (status, ack) = send(&app, signed("/webhook/retell", body, PROVIDER_KEY)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(ack["ack"], true);
        }

        let call = repo.find_by_remote_id("rc_1").await.unwrap().unwrap();
        assert_eq!(call.status, CallStatus::Ended);
        assert_eq!(call.duration_ms, Some(4200));
        assert_eq!(call.transcript.as_deref(), Some("Agent: Hi"));
        assert_eq!(call.call_summary.as_deref(), Some("Booked demo"));
    }

    #[tokio::test]
    async fn test_bad_signature_is_rejected_and_changes_nothing() {
        let (app, repo) = setup_app(FakeProvider::new(), config(&[]));
        send(
            &app,
            json_request("POST", "/api/calls", json!({ "to_number": "+15551234567" })),
        )
        .await;

        let body = event("call_ended", json!({ "call_id": "rc_1" }));
        let (status, _) = send(&app, signed("/webhook/retell", body.clone(), "wrong_key")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, json_request("POST", "/webhook/retell", body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let call = repo.find_by_remote_id("rc_1").await.unwrap().unwrap();
        assert_eq!(call.status, CallStatus::Initiated);
    }

    #[tokio::test]
    async fn test_unsigned_events_accepted_when_verification_disabled() {
        let (app, repo) = setup_app(
            FakeProvider::new(),
            config(&[("WEBHOOK_VERIFY_SIGNATURE", "false")]),
        );
        send(
            &app,
            json_request("POST", "/api/calls", json!({ "to_number": "+15551234567" })),
        )
        .await;

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/webhook/retell",
                event("call_started", json!({ "call_id": "rc_1" })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let call = repo.find_by_remote_id("rc_1").await.unwrap().unwrap();
        assert_eq!(call.status, CallStatus::Ongoing);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_request() {
        let (app, _) = setup_app(FakeProvider::new(), config(&[]));

        let (status, _) = send(
            &app,
            signed("/webhook-ingest", json!({ "event": "call_started", "call": {} }), PROVIDER_KEY),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_call_is_acknowledged_without_record() {
        let (app, repo) = setup_app(FakeProvider::new(), config(&[]));

        let (status, ack) = send(
            &app,
            signed(
                "/webhook/retell",
                event("call_ended", json!({ "call_id": "rc_elsewhere" })),
                PROVIDER_KEY,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["ack"], true);
        assert!(repo.list(None).await.unwrap().is_empty());
    }
}
