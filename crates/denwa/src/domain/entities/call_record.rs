//! CallRecord - Outbound call lifecycle record
//!
//! Pure domain entity without infrastructure dependencies. All status
//! transitions and field merges go through the methods here so every
//! store applies the same rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::CallEvent;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CallKind, CallStatus};

/// CallRecord - One outbound call and everything the provider reported about it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    pub id: Uuid,
    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    /// Destination number (absent for web calls)
    pub lead_phone: Option<String>,
    pub kind: CallKind,
    /// Provider call identifier, set once when the provider accepts the call
    pub remote_call_id: Option<String>,
    pub status: CallStatus,
    pub transcript: Option<String>,
    pub call_summary: Option<String>,
    pub recording_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub disconnection_reason: Option<String>,
    /// Provider error that moved the call to `failed`
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    /// Create a new queued call record
    pub fn new(
        kind: CallKind,
        lead_id: Option<String>,
        lead_name: Option<String>,
        lead_phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            lead_id,
            lead_name,
            lead_phone,
            kind,
            remote_call_id: None,
            status: CallStatus::Queued,
            transcript: None,
            call_summary: None,
            recording_url: None,
            duration_ms: None,
            disconnection_reason: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach the provider's call identifier and move to `initiated`.
    ///
    /// Re-attaching the same identifier is a no-op; a different one is a conflict.
    pub fn mark_initiated(&mut self, remote_call_id: &str) -> Result<(), DomainError> {
        if remote_call_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "Provider returned an empty call id".to_string(),
            ));
        }

        match self.remote_call_id.as_deref() {
            Some(existing) if existing == remote_call_id => return Ok(()),
            Some(existing) => {
                return Err(DomainError::Conflict(format!(
                    "Call {} already bound to remote call {}",
                    self.id, existing
                )))
            }
            None => {}
        }

        self.remote_call_id = Some(remote_call_id.to_string());
        self.status = self.status.advance_to(CallStatus::Initiated);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the call as failed, recording the error. Terminal records are left alone.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let error = error.into();
        self.status = CallStatus::Failed;
        fill_if_absent(&mut self.error_detail, Some(&error));
        self.updated_at = Utc::now();
        true
    }

    /// Apply a webhook event using rank-monotonic status merge and
    /// write-once-if-absent field merge.
    ///
    /// Returns whether anything changed, so duplicate deliveries are
    /// observable as no-ops.
    pub fn apply_event(&mut self, event: &CallEvent) -> Result<bool, DomainError> {
        if self.remote_call_id.as_deref() != Some(event.remote_call_id.as_str()) {
            return Err(DomainError::Conflict(format!(
                "Event for remote call {} does not belong to call {}",
                event.remote_call_id, self.id
            )));
        }

        let Some(implied) = event.kind.implied_status() else {
            return Ok(false);
        };

        let mut changed = false;

        let next = self.status.advance_to(implied);
        if next != self.status {
            self.status = next;
            changed = true;
        }

        changed |= fill_if_absent(&mut self.transcript, event.transcript.as_ref());
        changed |= fill_if_absent(&mut self.call_summary, event.call_summary.as_ref());
        changed |= fill_if_absent(&mut self.recording_url, event.recording_url.as_ref());

        if event.kind.is_terminal() {
            if self.duration_ms.is_none() {
                if let Some(duration) = event.duration_ms.filter(|d| *d >= 0) {
                    self.duration_ms = Some(duration);
                    changed = true;
                }
            }
            changed |= fill_if_absent(
                &mut self.disconnection_reason,
                event.disconnection_reason.as_ref(),
            );
        }

        if changed {
            self.updated_at = Utc::now();
        }
        Ok(changed)
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript.is_some()
    }

    pub fn has_summary(&self) -> bool {
        self.call_summary.is_some()
    }
}

/// Fill `slot` with a non-blank `value` only when `slot` is still empty.
fn fill_if_absent(slot: &mut Option<String>, value: Option<&String>) -> bool {
    if slot.is_some() {
        return false;
    }
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => {
            *slot = Some(v.clone());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::CallEventKind;

    fn initiated(remote_call_id: &str) -> CallRecord {
        let mut call = CallRecord::new(
            CallKind::Phone,
            Some("lead1".to_string()),
            Some("Shivi".to_string()),
            Some("+15551234567".to_string()),
        );
        call.mark_initiated(remote_call_id).unwrap();
        call
    }

    fn started(id: &str) -> CallEvent {
        CallEvent::new(CallEventKind::CallStarted, id)
    }

    fn ended(id: &str) -> CallEvent {
        CallEvent::new(CallEventKind::CallEnded, id)
            .with_duration_ms(4200)
            .with_recording_url("https://cdn.example/rc_1.wav")
    }

    fn analyzed(id: &str) -> CallEvent {
        CallEvent::new(CallEventKind::CallAnalyzed, id)
            .with_transcript("Agent: Hi\nUser: Hello")
            .with_call_summary("Lead is interested")
    }

    /// Heap's algorithm, enough for a handful of events
    fn permutations(events: &[CallEvent]) -> Vec<Vec<CallEvent>> {
        fn permute(k: usize, items: &mut Vec<CallEvent>, out: &mut Vec<Vec<CallEvent>>) {
            if k <= 1 {
                out.push(items.clone());
                return;
            }
            permute(k - 1, items, out);
            for i in 0..k - 1 {
                if k % 2 == 0 {
                    items.swap(i, k - 1);
                } else {
                    items.swap(0, k - 1);
                }
                permute(k - 1, items, out);
            }
        }
        let mut items = events.to_vec();
        let mut out = Vec::new();
        permute(items.len(), &mut items, &mut out);
        out
    }

    #[test]
    fn test_new_record_is_queued_without_remote_id() {
        let call = CallRecord::new(CallKind::Phone, None, None, Some("+15551234567".into()));
        assert_eq!(call.status, CallStatus::Queued);
        assert!(call.remote_call_id.is_none());
        assert!(call.transcript.is_none());
    }

    #[test]
    fn test_happy_path_lifecycle() {
        let mut call = initiated("rc_1");
        assert_eq!(call.status, CallStatus::Initiated);

        assert!(call.apply_event(&started("rc_1")).unwrap());
        assert_eq!(call.status, CallStatus::Ongoing);

        assert!(call.apply_event(&ended("rc_1")).unwrap());
        assert_eq!(call.status, CallStatus::Ended);
        assert_eq!(call.duration_ms, Some(4200));

        assert!(call.apply_event(&analyzed("rc_1")).unwrap());
        assert_eq!(call.status, CallStatus::Ended);
        assert_eq!(call.transcript.as_deref(), Some("Agent: Hi\nUser: Hello"));
        assert_eq!(call.call_summary.as_deref(), Some("Lead is interested"));
    }

    #[test]
    fn test_late_started_does_not_regress() {
        let mut call = initiated("rc_1");
        call.apply_event(&ended("rc_1")).unwrap();
        assert_eq!(call.status, CallStatus::Ended);

        let changed = call.apply_event(&started("rc_1")).unwrap();
        assert!(!changed);
        assert_eq!(call.status, CallStatus::Ended);
    }

    #[test]
    fn test_duplicate_event_is_idempotent() {
        let mut call = initiated("rc_1");
        call.apply_event(&ended("rc_1")).unwrap();
        let snapshot = call.clone();

        let changed = call.apply_event(&ended("rc_1")).unwrap();
        assert!(!changed);
        assert_eq!(call, snapshot);
    }

    #[test]
    fn test_set_fields_are_never_overwritten() {
        let mut call = initiated("rc_1");
        call.apply_event(&analyzed("rc_1")).unwrap();

        let later = CallEvent::new(CallEventKind::CallAnalyzed, "rc_1")
            .with_transcript("")
            .with_call_summary("A different summary");
        call.apply_event(&later).unwrap();

        assert_eq!(call.transcript.as_deref(), Some("Agent: Hi\nUser: Hello"));
        assert_eq!(call.call_summary.as_deref(), Some("Lead is interested"));
    }

    #[test]
    fn test_blank_values_do_not_fill_fields() {
        let mut call = initiated("rc_1");
        let event = CallEvent::new(CallEventKind::CallEnded, "rc_1")
            .with_transcript("   ")
            .with_recording_url("");
        call.apply_event(&event).unwrap();

        assert!(call.transcript.is_none());
        assert!(call.recording_url.is_none());
    }

    #[test]
    fn test_duration_only_from_terminal_events() {
        let mut call = initiated("rc_1");
        call.apply_event(&started("rc_1").with_duration_ms(10)).unwrap();
        assert!(call.duration_ms.is_none());
    }

    #[test]
    fn test_terminal_failed_still_fills_absent_fields() {
        let mut call = initiated("rc_1");
        call.mark_failed("carrier rejected");
        assert_eq!(call.status, CallStatus::Failed);

        assert!(call.apply_event(&analyzed("rc_1")).unwrap());
        assert_eq!(call.status, CallStatus::Failed);
        assert!(call.has_transcript());
    }

    #[test]
    fn test_unknown_event_changes_nothing() {
        let mut call = initiated("rc_1");
        let event = CallEvent::new(CallEventKind::from("transcript_updated"), "rc_1")
            .with_transcript("partial");
        assert!(!call.apply_event(&event).unwrap());
        assert!(call.transcript.is_none());
        assert_eq!(call.status, CallStatus::Initiated);
    }

    #[test]
    fn test_event_for_other_remote_id_is_rejected() {
        let mut call = initiated("rc_1");
        assert!(matches!(
            call.apply_event(&started("rc_2")),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn test_queued_record_cannot_take_events() {
        let mut call = CallRecord::new(CallKind::Web, None, None, None);
        assert!(call.apply_event(&started("rc_1")).is_err());
        assert_eq!(call.status, CallStatus::Queued);
    }

    #[test]
    fn test_remote_id_is_immutable() {
        let mut call = initiated("rc_1");
        assert!(call.mark_initiated("rc_1").is_ok());
        assert!(matches!(
            call.mark_initiated("rc_2"),
            Err(DomainError::Conflict(_))
        ));
        assert_eq!(call.remote_call_id.as_deref(), Some("rc_1"));
    }

    #[test]
    fn test_mark_failed_ignores_terminal_records() {
        let mut call = initiated("rc_1");
        call.apply_event(&ended("rc_1")).unwrap();
        assert!(!call.mark_failed("too late"));
        assert_eq!(call.status, CallStatus::Ended);
        assert!(call.error_detail.is_none());
    }

    #[test]
    fn test_any_delivery_order_converges() {
        let first_transcript = CallEvent::new(CallEventKind::CallEnded, "rc_1")
            .with_duration_ms(4200)
            .with_transcript("Agent: Hi\nUser: Hello");
        let events = vec![
            started("rc_1"),
            first_transcript.clone(),
            first_transcript,
            analyzed("rc_1"),
        ];

        let mut outcomes = Vec::new();
        for order in permutations(&events) {
            let mut call = initiated("rc_1");
            for event in &order {
                call.apply_event(event).unwrap();
            }
            outcomes.push((
                call.status,
                call.transcript,
                call.call_summary,
                call.duration_ms,
            ));
        }

        for outcome in &outcomes {
            assert_eq!(outcome.0, CallStatus::Ended);
            assert_eq!(outcome.1.as_deref(), Some("Agent: Hi\nUser: Hello"));
            assert_eq!(outcome.2.as_deref(), Some("Lead is interested"));
            assert_eq!(outcome.3, Some(4200));
        }
    }
}
