//! CallEventKind - Provider webhook event types

use serde::{Deserialize, Serialize};

use super::CallStatus;

/// Event types posted by the provider's webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallEventKind {
    CallStarted,
    CallEnded,
    CallAnalyzed,
    /// Event types this service does not act on (e.g. transcript updates)
    Other(String),
}

impl CallEventKind {
    /// Status this event proves the call has reached, if any.
    ///
    /// Analysis is only produced for a finished call, so it implies `ended`.
    pub fn implied_status(&self) -> Option<CallStatus> {
        match self {
            CallEventKind::CallStarted => Some(CallStatus::Ongoing),
            CallEventKind::CallEnded | CallEventKind::CallAnalyzed => Some(CallStatus::Ended),
            CallEventKind::Other(_) => None,
        }
    }

    /// Whether the event may carry end-of-call data (duration, disconnection reason)
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallEventKind::CallEnded | CallEventKind::CallAnalyzed)
    }
}

impl From<&str> for CallEventKind {
    fn from(s: &str) -> Self {
        match s {
            "call_started" => CallEventKind::CallStarted,
            "call_ended" => CallEventKind::CallEnded,
            "call_analyzed" => CallEventKind::CallAnalyzed,
            other => CallEventKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for CallEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CallStarted => write!(f, "call_started"),
            Self::CallEnded => write!(f, "call_ended"),
            Self::CallAnalyzed => write!(f, "call_analyzed"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}
