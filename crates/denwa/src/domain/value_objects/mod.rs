//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod call_event_kind;
mod call_kind;
mod call_status;

pub use call_event_kind::*;
pub use call_kind::*;
pub use call_status::*;
