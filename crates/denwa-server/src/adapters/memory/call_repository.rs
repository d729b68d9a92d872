//! In-memory implementation of CallRepository
//!
//! Used for local runs without a database and by the test suite. A single
//! `RwLock` over the whole store gives the per-record atomicity `update`
//! needs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use denwa::{CallEvent, CallMutation, CallRecord, CallRepository, DomainError, UpdatedCall};

#[derive(Default)]
struct Inner {
    calls: HashMap<Uuid, CallRecord>,
    /// Unique index: remote call ID -> record ID
    by_remote_id: HashMap<String, Uuid>,
    parked: Vec<CallEvent>,
}

/// In-memory implementation of CallRepository
#[derive(Default)]
pub struct InMemoryCallRepository {
    inner: RwLock<Inner>,
}

impl InMemoryCallRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn parked_len(&self) -> usize {
        self.inner.read().await.parked.len()
    }
}

#[async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn create(&self, call: &CallRecord) -> Result<Uuid, DomainError> {
        let mut inner = self.inner.write().await;

        if inner.calls.contains_key(&call.id) {
            return Err(DomainError::Storage(format!(
                "Call {} already exists",
                call.id
            )));
        }
        if let Some(remote_id) = &call.remote_call_id {
            if inner.by_remote_id.contains_key(remote_id) {
                return Err(DomainError::Storage(format!(
                    "Remote call {} is already bound",
                    remote_id
                )));
            }
            inner.by_remote_id.insert(remote_id.clone(), call.id);
        }

        inner.calls.insert(call.id, call.clone());
        Ok(call.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, DomainError> {
        Ok(self.inner.read().await.calls.get(&id).cloned())
    }

    async fn find_by_remote_id(
        &self,
        remote_call_id: &str,
    ) -> Result<Option<CallRecord>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_remote_id
            .get(remote_call_id)
            .and_then(|id| inner.calls.get(id))
            .cloned())
    }

    async fn update(&self, id: Uuid, mutation: CallMutation) -> Result<UpdatedCall, DomainError> {
        let mut inner = self.inner.write().await;

        let current = inner
            .calls
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::Storage(format!("Call {} does not exist", id)))?;

        let mut next = current.clone();
        let changed = mutation(&mut next)?;
        if !changed {
            return Ok(UpdatedCall {
                record: current,
                changed,
            });
        }

        if next.remote_call_id != current.remote_call_id {
            if let Some(remote_id) = &next.remote_call_id {
                let owner = inner.by_remote_id.get(remote_id).copied();
                if owner.is_some_and(|owner| owner != id) {
                    return Err(DomainError::Storage(format!(
                        "Remote call {} is already bound",
                        remote_id
                    )));
                }
                inner.by_remote_id.insert(remote_id.clone(), id);
            }
        }

        inner.calls.insert(id, next.clone());
        Ok(UpdatedCall {
            record: next,
            changed,
        })
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<CallRecord>, DomainError> {
        let inner = self.inner.read().await;
        let mut calls: Vec<CallRecord> = inner.calls.values().cloned().collect();
        calls.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = limit {
            calls.truncate(limit.max(0) as usize);
        }
        Ok(calls)
    }

    async fn park_event(&self, event: &CallEvent) -> Result<(), DomainError> {
        self.inner.write().await.parked.push(event.clone());
        Ok(())
    }

    async fn take_parked_events(
        &self,
        remote_call_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, DomainError> {
        let mut inner = self.inner.write().await;
        let (mut taken, kept): (Vec<CallEvent>, Vec<CallEvent>) =
            std::mem::take(&mut inner.parked)
                .into_iter()
                .partition(|e| e.remote_call_id == remote_call_id && e.received_at >= since);
        inner.parked = kept;
        taken.sort_by_key(|e| e.received_at);
        Ok(taken)
    }

    async fn purge_parked_events(&self, before: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut inner = self.inner.write().await;
        let len = inner.parked.len();
        inner.parked.retain(|e| e.received_at >= before);
        Ok((len - inner.parked.len()) as u64)
    }
}
