//! HTTP Data Models
//!
//! Request/response DTOs for the HTTP API. Domain types stay in the
//! `denwa` crate; these only shape what goes over the wire.

mod call;
mod phone_number;
mod webhook;

pub use call::*;
pub use phone_number::*;
pub use webhook::*;
