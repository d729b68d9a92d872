//! CallStatus - Lifecycle stage of a call record

use serde::{Deserialize, Serialize};

/// Call lifecycle status
///
/// Non-terminal stages advance in rank order
/// `queued → initiated → ongoing → ended`; `failed` is a terminal
/// state reachable from any non-terminal stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    #[default]
    Queued,
    Initiated,
    Ongoing,
    Ended,
    Failed,
}

impl CallStatus {
    /// Position in the lifecycle ordering. Both terminal states share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            CallStatus::Queued => 0,
            CallStatus::Initiated => 1,
            CallStatus::Ongoing => 2,
            CallStatus::Ended | CallStatus::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Ended | CallStatus::Failed)
    }

    /// Rank-monotonic merge: the status after observing `implied`.
    ///
    /// Terminal states are absorbing; otherwise the higher-ranked status wins.
    pub fn advance_to(self, implied: CallStatus) -> CallStatus {
        if self.is_terminal() || implied.rank() <= self.rank() {
            self
        } else {
            implied
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Queued => "queued",
            CallStatus::Initiated => "initiated",
            CallStatus::Ongoing => "ongoing",
            CallStatus::Ended => "ended",
            CallStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(CallStatus::Queued),
            "initiated" => Ok(CallStatus::Initiated),
            "ongoing" => Ok(CallStatus::Ongoing),
            "ended" => Ok(CallStatus::Ended),
            "failed" => Ok(CallStatus::Failed),
            _ => Err(format!("Unknown call status: {}", s)),
        }
    }
}
