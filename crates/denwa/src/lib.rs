//! Denwa Domain Library
//!
//! Core domain types and interfaces for brokering outbound AI voice calls
//! and reconciling their lifecycle from provider webhooks.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (CallRecord, CallEvent)
//!   - `value_objects/`: Immutable value types (CallStatus, CallKind, CallEventKind)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces
//!   - `services/`: External service interfaces
//!
//! # Usage
//!
//! ```rust,ignore
//! use denwa::domain::{CallRecord, CallEvent, CallStatus};
//! use denwa::ports::{CallRepository, CallProvider};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    CallEvent, CallEventKind, CallKind, CallRecord, CallStatus, DomainError,
};
pub use ports::{
    // Repositories
    CallMutation,
    // Provider capabilities
    CallProvider,
    CallRepository,
    PhoneCallRequest,
    PhoneNumber,
    PhoneNumberImport,
    PlacedCall,
    PlacedWebCall,
    SipTransport,
    UpdatedCall,
    WebCallRequest,
};
