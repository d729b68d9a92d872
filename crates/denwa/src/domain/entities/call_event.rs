//! CallEvent - Normalized provider webhook event
//!
//! Provider payloads are translated into this shape at the edge so the
//! lifecycle rules never see provider-specific types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::CallEventKind;

/// A lifecycle event reported by the provider for one remote call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallEvent {
    pub kind: CallEventKind,
    /// Correlation key: the provider's call identifier
    pub remote_call_id: String,
    pub transcript: Option<String>,
    pub call_summary: Option<String>,
    pub recording_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub disconnection_reason: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl CallEvent {
    pub fn new(kind: CallEventKind, remote_call_id: impl Into<String>) -> Self {
        Self {
            kind,
            remote_call_id: remote_call_id.into(),
            transcript: None,
            call_summary: None,
            recording_url: None,
            duration_ms: None,
            disconnection_reason: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_call_summary(mut self, summary: impl Into<String>) -> Self {
        self.call_summary = Some(summary.into());
        self
    }

    pub fn with_recording_url(mut self, url: impl Into<String>) -> Self {
        self.recording_url = Some(url.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_disconnection_reason(mut self, reason: impl Into<String>) -> Self {
        self.disconnection_reason = Some(reason.into());
        self
    }
}
