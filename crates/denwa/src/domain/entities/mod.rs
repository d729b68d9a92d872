//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - CallRecord: Outbound call and its provider-reported lifecycle
//! - CallEvent: Normalized provider webhook event

mod call_event;
mod call_record;

pub use call_event::*;
pub use call_record::*;
