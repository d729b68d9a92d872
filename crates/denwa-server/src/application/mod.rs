//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! repositories and the calling provider.

mod call_service;
mod phone_number_service;

#[cfg(test)]
pub(crate) mod testing;

pub use call_service::{
    CallDefaults, CallInitiation, CallService, InitiateCall, InitiateWebCall, WebCallSession,
    WebhookOutcome,
};
pub use phone_number_service::PhoneNumberService;
