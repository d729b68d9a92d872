//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod memory;
pub mod postgres;
pub mod retell;

// Re-exports
pub use postgres::PgCallRepository;
pub use retell::RetellGateway;
