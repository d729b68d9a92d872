//! Retell AI adapter
//!
//! - `gateway`: REST client implementing `CallProvider`
//! - `webhook`: event envelope parsing and signature verification

mod gateway;
pub mod webhook;

pub use gateway::RetellGateway;
