//! CallKind - Which provider capability placed the call

use serde::{Deserialize, Serialize};

/// How a call reaches the lead
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    /// Real phone call over the provider's telephony
    #[default]
    Phone,
    /// Browser test session, no phone number involved
    Web,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallKind::Phone => write!(f, "phone"),
            CallKind::Web => write!(f, "web"),
        }
    }
}

impl std::str::FromStr for CallKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phone" => Ok(CallKind::Phone),
            "web" => Ok(CallKind::Web),
            _ => Err(format!("Unknown call kind: {}", s)),
        }
    }
}
