//! CallRecord Repository Port
//!
//! Abstract interface for call record persistence and webhook
//! correlation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{CallEvent, CallRecord};
use crate::domain::errors::DomainError;

/// Partial update applied to one record under that record's lock.
///
/// Returns whether the record changed; stores skip the write when it did
/// not. An `Err` aborts the update and leaves the stored record untouched.
pub type CallMutation =
    Box<dyn FnOnce(&mut CallRecord) -> Result<bool, DomainError> + Send + 'static>;

/// Result of an atomic update
#[derive(Debug, Clone)]
pub struct UpdatedCall {
    pub record: CallRecord,
    pub changed: bool,
}

/// Repository interface for CallRecord entities
///
/// `update` is the only synchronization point the lifecycle rules rely on:
/// concurrent updates to the same record must be serialized.
#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Persist a new record. Fails with `Storage` on a duplicate id.
    async fn create(&self, call: &CallRecord) -> Result<Uuid, DomainError>;

    /// Find a record by its internal ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, DomainError>;

    /// Find the record bound to a provider call ID
    async fn find_by_remote_id(&self, remote_call_id: &str)
        -> Result<Option<CallRecord>, DomainError>;

    /// Atomically apply `mutation` to the record with `id`.
    ///
    /// Fails with `Storage` when the record does not exist or when the
    /// mutation would bind a remote call ID already used by another record.
    async fn update(&self, id: Uuid, mutation: CallMutation) -> Result<UpdatedCall, DomainError>;

    /// List records newest first, optionally bounded
    async fn list(&self, limit: Option<i64>) -> Result<Vec<CallRecord>, DomainError>;

    // --- Parked webhook events ---

    /// Keep an event whose remote call ID matched no record
    async fn park_event(&self, event: &CallEvent) -> Result<(), DomainError>;

    /// Remove and return parked events for a remote call ID received at or
    /// after `since`, oldest first
    async fn take_parked_events(
        &self,
        remote_call_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, DomainError>;

    /// Drop parked events received before `before`; returns how many were dropped
    async fn purge_parked_events(&self, before: DateTime<Utc>) -> Result<u64, DomainError>;
}
