//! Call Application Service (Use Case)
//!
//! Drives a call record from creation to its terminal state: creates the
//! queued record, places the call through the provider, binds the remote
//! call ID and folds webhook events into the record.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use denwa::{
    CallEvent, CallKind, CallMutation, CallProvider, CallRecord, CallRepository, DomainError,
    PhoneCallRequest, UpdatedCall, WebCallRequest,
};

/// Fallbacks for values a request may leave out
#[derive(Debug, Clone, Default)]
pub struct CallDefaults {
    pub agent_id: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
}

/// Request to place an outbound phone call
#[derive(Debug, Clone, Default)]
pub struct InitiateCall {
    pub to_number: Option<String>,
    pub from_number: Option<String>,
    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    pub agent_id: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Request to open a browser test call
#[derive(Debug, Clone, Default)]
pub struct InitiateWebCall {
    pub lead_name: Option<String>,
    pub agent_id: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A web call the browser can join
#[derive(Debug, Clone)]
pub struct WebCallSession {
    pub record: CallRecord,
    pub access_token: String,
    pub test_url: String,
}

/// Outcome of handing a new call to the provider
#[derive(Debug)]
pub enum CallInitiation<T> {
    Placed(T),
    /// The provider rejected the call; the record is now `failed`
    Failed { record: CallRecord, error: DomainError },
}

/// What happened to a webhook event
#[derive(Debug)]
pub enum WebhookOutcome {
    Applied { record: CallRecord, changed: bool },
    /// No record carries the remote call ID (yet); the event was parked
    Orphaned,
    /// The event kind carries no lifecycle meaning
    Ignored,
}

/// Application service for the call lifecycle
pub struct CallService<R: CallRepository + ?Sized, P: CallProvider + ?Sized> {
    repo: Arc<R>,
    provider: Arc<P>,
    defaults: CallDefaults,
    orphan_retention: Duration,
}

impl<R: CallRepository + ?Sized, P: CallProvider + ?Sized> CallService<R, P> {
    pub fn new(
        repo: Arc<R>,
        provider: Arc<P>,
        defaults: CallDefaults,
        orphan_retention: std::time::Duration,
    ) -> Self {
        Self {
            repo,
            provider,
            defaults,
            orphan_retention: Duration::from_std(orphan_retention)
                .unwrap_or_else(|_| Duration::minutes(10)),
        }
    }

    /// Create a queued record and place the call.
    ///
    /// Missing destination, caller ID or agent is a `Validation` error and
    /// nothing is stored. A provider rejection is not an `Err`: the record
    /// is marked failed and returned in `CallInitiation::Failed`.
    pub async fn initiate_call(
        &self,
        input: InitiateCall,
    ) -> Result<CallInitiation<CallRecord>, DomainError> {
        let to_number = resolve("to_number", input.to_number, &self.defaults.to_number)?;
        let from_number = resolve("from_number", input.from_number, &self.defaults.from_number)?;
        let agent_id = resolve("agent_id", input.agent_id, &self.defaults.agent_id)?;
        let lead_id = non_blank(input.lead_id);
        let lead_name = non_blank(input.lead_name);

        let record = CallRecord::new(
            CallKind::Phone,
            lead_id.clone(),
            lead_name.clone(),
            Some(to_number.clone()),
        );
        self.repo.create(&record).await?;
        tracing::info!("Created call {} to {}", record.id, to_number);

        let request = PhoneCallRequest {
            to_number,
            from_number,
            agent_id,
            metadata: call_metadata(input.metadata, record.id, lead_id.as_deref()),
            dynamic_variables: prompt_variables(lead_name.as_deref()),
        };

        match self.provider.place_call(request).await {
            Ok(placed) => {
                let record = self.bind_remote_id(record.id, placed.remote_call_id).await?;
                Ok(CallInitiation::Placed(record))
            }
            Err(error) => {
                let record = self.fail(record.id, &error).await?;
                Ok(CallInitiation::Failed { record, error })
            }
        }
    }

    /// Create a queued web call record and open a browser session for it
    pub async fn initiate_web_call(
        &self,
        input: InitiateWebCall,
    ) -> Result<CallInitiation<WebCallSession>, DomainError> {
        let agent_id = resolve("agent_id", input.agent_id, &self.defaults.agent_id)?;
        let lead_name = non_blank(input.lead_name);

        let record = CallRecord::new(CallKind::Web, None, lead_name.clone(), None);
        self.repo.create(&record).await?;
        tracing::info!("Created web call {}", record.id);

        let request = WebCallRequest {
            agent_id,
            metadata: call_metadata(input.metadata, record.id, None),
            dynamic_variables: prompt_variables(lead_name.as_deref()),
        };

        match self.provider.place_web_call(request).await {
            Ok(placed) => {
                let record = self.bind_remote_id(record.id, placed.remote_call_id).await?;
                Ok(CallInitiation::Placed(WebCallSession {
                    record,
                    access_token: placed.access_token,
                    test_url: placed.test_url,
                }))
            }
            Err(error) => {
                let record = self.fail(record.id, &error).await?;
                Ok(CallInitiation::Failed { record, error })
            }
        }
    }

    /// Fold a normalized webhook event into the record it belongs to
    pub async fn apply_webhook_event(
        &self,
        event: CallEvent,
    ) -> Result<WebhookOutcome, DomainError> {
        if event.kind.implied_status().is_none() {
            tracing::debug!(
                "Ignoring {} event for remote call {}",
                event.kind,
                event.remote_call_id
            );
            return Ok(WebhookOutcome::Ignored);
        }

        if let Some(record) = self.repo.find_by_remote_id(&event.remote_call_id).await? {
            let updated = self.apply_to(record.id, event).await?;
            return Ok(WebhookOutcome::Applied {
                record: updated.record,
                changed: updated.changed,
            });
        }

        tracing::info!(
            "No call for remote call {} ({}); parking event",
            event.remote_call_id,
            event.kind
        );
        let remote_call_id = event.remote_call_id.clone();
        self.repo.park_event(&event).await?;

        let purged = self
            .repo
            .purge_parked_events(Utc::now() - self.orphan_retention)
            .await?;
        if purged > 0 {
            tracing::debug!("Discarded {} expired parked events", purged);
        }

        // The remote ID may have been bound while the event was being parked
        if let Some(record) = self.repo.find_by_remote_id(&remote_call_id).await? {
            let (record, changed) = self.replay_parked(record).await?;
            return Ok(WebhookOutcome::Applied { record, changed });
        }

        Ok(WebhookOutcome::Orphaned)
    }

    /// List calls newest first
    pub async fn list_calls(&self, limit: Option<i64>) -> Result<Vec<CallRecord>, DomainError> {
        self.repo.list(limit).await
    }

    /// Look a call up by internal ID, falling back to the remote call ID
    pub async fn get_call(&self, key: &str) -> Result<CallRecord, DomainError> {
        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(record) = self.repo.find_by_id(id).await? {
                return Ok(record);
            }
        }

        self.repo
            .find_by_remote_id(key)
            .await?
            .ok_or_else(|| DomainError::not_found_str("Call", key))
    }

    async fn bind_remote_id(
        &self,
        id: Uuid,
        remote_call_id: String,
    ) -> Result<CallRecord, DomainError> {
        let remote = remote_call_id.clone();
        let mutation: CallMutation = Box::new(move |call: &mut CallRecord| -> Result<bool, DomainError> {
            call.mark_initiated(&remote)?;
            Ok(true)
        });
        let updated = match self.repo.update(id, mutation).await {
            Ok(updated) => updated,
            Err(error) => {
                // The provider call is live but cannot be tracked
                tracing::error!(
                    "Could not bind call {} to remote call {}: {}",
                    id,
                    remote_call_id,
                    error
                );
                if let Err(e) = self.fail(id, &error).await {
                    tracing::error!("Could not mark call {} failed: {}", id, e);
                }
                return Err(error);
            }
        };
        tracing::info!("Call {} bound to remote call {}", id, remote_call_id);

        Ok(self.replay_parked(updated.record).await?.0)
    }

    /// Apply parked events for the record's remote ID; reports whether any changed it
    async fn replay_parked(&self, record: CallRecord) -> Result<(CallRecord, bool), DomainError> {
        let Some(remote_call_id) = record.remote_call_id.clone() else {
            return Ok((record, false));
        };

        let parked = self
            .repo
            .take_parked_events(&remote_call_id, Utc::now() - self.orphan_retention)
            .await?;
        if parked.is_empty() {
            return Ok((record, false));
        }

        tracing::info!(
            "Replaying {} parked events for remote call {}",
            parked.len(),
            remote_call_id
        );
        let mut record = record;
        let mut changed = false;
        for event in parked {
            let updated = self.apply_to(record.id, event).await?;
            changed |= updated.changed;
            record = updated.record;
        }
        Ok((record, changed))
    }

    async fn apply_to(&self, id: Uuid, event: CallEvent) -> Result<UpdatedCall, DomainError> {
        let kind = event.kind.clone();
        let mutation: CallMutation =
            Box::new(move |call: &mut CallRecord| call.apply_event(&event));
        let updated = self.repo.update(id, mutation).await?;

        if updated.changed {
            tracing::info!(
                "Call {} applied {} -> {}",
                id,
                kind,
                updated.record.status
            );
        } else {
            tracing::debug!("Call {} unchanged by duplicate {}", id, kind);
        }
        Ok(updated)
    }

    async fn fail(&self, id: Uuid, error: &DomainError) -> Result<CallRecord, DomainError> {
        tracing::warn!("Call {} failed: {}", id, error);
        let detail = error.to_string();
        let mutation: CallMutation =
            Box::new(move |call: &mut CallRecord| -> Result<bool, DomainError> {
                Ok(call.mark_failed(detail))
            });
        Ok(self.repo.update(id, mutation).await?.record)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve(
    field: &str,
    requested: Option<String>,
    default: &Option<String>,
) -> Result<String, DomainError> {
    non_blank(requested)
        .or_else(|| non_blank(default.clone()))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "No {} provided and no default is configured",
                field
            ))
        })
}

fn call_metadata(
    mut metadata: serde_json::Map<String, serde_json::Value>,
    id: Uuid,
    lead_id: Option<&str>,
) -> serde_json::Map<String, serde_json::Value> {
    metadata.insert("internal_call_id".to_string(), id.to_string().into());
    if let Some(lead_id) = lead_id {
        metadata.insert("lead_id".to_string(), lead_id.into());
    }
    metadata
}

fn prompt_variables(lead_name: Option<&str>) -> HashMap<String, String> {
    lead_name
        .map(|name| HashMap::from([("customer_name".to_string(), name.to_string())]))
        .unwrap_or_default()
}
