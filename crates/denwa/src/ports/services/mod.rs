//! Service Ports
//!
//! Abstract interfaces for external services.

mod call_provider;

pub use call_provider::*;
