//! Retell webhook payloads
//!
//! Parses the Retell event envelope into a normalized `CallEvent` and
//! verifies the `x-retell-signature` header.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use denwa::{CallEvent, CallEventKind, DomainError};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-retell-signature";

/// Maximum age (and future skew) of a signature timestamp
const SIGNATURE_TOLERANCE_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,

    #[error("signature header is malformed")]
    Malformed,

    #[error("signature timestamp is outside the allowed window")]
    Expired,

    #[error("signature does not match")]
    Mismatch,
}

/// Verify a `v=<timestamp_ms>,d=<hex hmac>` header against the raw body.
///
/// The digest is HMAC-SHA256 keyed with `key` over the body followed by the
/// decimal timestamp.
pub fn verify_signature(
    key: &str,
    body: &[u8],
    header: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut digest = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("v", value)) => timestamp = Some(value),
            Some(("d", value)) => digest = Some(value),
            _ => {}
        }
    }
    let (timestamp, digest) = timestamp.zip(digest).ok_or(SignatureError::Malformed)?;

    let millis: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;
    let skew = now
        .timestamp_millis()
        .checked_sub(millis)
        .map(i64::unsigned_abs)
        .ok_or(SignatureError::Expired)?;
    if skew > SIGNATURE_TOLERANCE_MS {
        return Err(SignatureError::Expired);
    }

    mac(key, body, timestamp)
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn mac(key: &str, body: &[u8], timestamp: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac.update(timestamp.as_bytes());
    mac
}

/// Build a header value the way Retell does
#[cfg(test)]
pub(crate) fn sign(key: &str, body: &[u8], at: DateTime<Utc>) -> String {
    let timestamp = at.timestamp_millis().to_string();
    let digest = hex::encode(mac(key, body, &timestamp).finalize().into_bytes());
    format!("v={},d={}", timestamp, digest)
}

// ============================================
// Envelope
// ============================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(alias = "event_type")]
    event: Option<String>,
    call: Option<CallPayload>,
}

#[derive(Debug, Deserialize)]
struct CallPayload {
    #[serde(alias = "remote_call_id")]
    call_id: Option<String>,
    transcript: Option<String>,
    recording_url: Option<String>,
    duration_ms: Option<i64>,
    start_timestamp: Option<i64>,
    end_timestamp: Option<i64>,
    disconnection_reason: Option<String>,
    call_summary: Option<String>,
    call_analysis: Option<CallAnalysis>,
}

#[derive(Debug, Deserialize)]
struct CallAnalysis {
    call_summary: Option<String>,
}

/// Parse and normalize a webhook body.
///
/// Fails with `Validation` on invalid JSON or when no call id is present.
/// A missing event name yields `CallEventKind::Other`.
pub fn parse_event(body: &[u8]) -> Result<CallEvent, DomainError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| DomainError::Validation(format!("Invalid webhook body: {e}")))?;

    let call = envelope
        .call
        .ok_or_else(|| DomainError::Validation("Webhook has no call object".to_string()))?;

    let remote_call_id = call
        .call_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DomainError::Validation("Webhook has no call id".to_string()))?
        .to_string();

    let kind = CallEventKind::from(envelope.event.as_deref().unwrap_or("unknown"));

    let duration_ms = call.duration_ms.or_else(|| {
        call.start_timestamp
            .zip(call.end_timestamp)
            .and_then(|(start, end)| end.checked_sub(start))
            .filter(|d| *d >= 0)
    });
    let call_summary = call
        .call_analysis
        .and_then(|analysis| analysis.call_summary)
        .or(call.call_summary);

    Ok(CallEvent {
        kind,
        remote_call_id,
        transcript: call.transcript,
        call_summary,
        recording_url: call.recording_url,
        duration_ms,
        disconnection_reason: call.disconnection_reason,
        received_at: Utc::now(),
    })
}
