//! PostgreSQL implementation of CallRepository
//!
//! `update` runs inside a transaction holding a row lock
//! (`SELECT ... FOR UPDATE`) on the call, so concurrent webhook
//! deliveries for the same call are serialized while different calls
//! proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use denwa::{CallEvent, CallMutation, CallRecord, CallRepository, DomainError, UpdatedCall};

/// PostgreSQL implementation of CallRepository
pub struct PgCallRepository {
    pool: PgPool,
}

impl PgCallRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(e: sqlx::Error) -> DomainError {
    DomainError::Storage(e.to_string())
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct CallRow {
    id: Uuid,
    lead_id: Option<String>,
    lead_name: Option<String>,
    lead_phone: Option<String>,
    kind: String,
    remote_call_id: Option<String>,
    status: String,
    transcript: Option<String>,
    call_summary: Option<String>,
    recording_url: Option<String>,
    duration_ms: Option<i64>,
    disconnection_reason: Option<String>,
    error_detail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CallRow> for CallRecord {
    type Error = DomainError;

    fn try_from(row: CallRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            lead_id: row.lead_id,
            lead_name: row.lead_name,
            lead_phone: row.lead_phone,
            kind: row.kind.parse().map_err(DomainError::Storage)?,
            remote_call_id: row.remote_call_id,
            status: row.status.parse().map_err(DomainError::Storage)?,
            transcript: row.transcript,
            call_summary: row.call_summary,
            recording_url: row.recording_url,
            duration_ms: row.duration_ms,
            disconnection_reason: row.disconnection_reason,
            error_detail: row.error_detail,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParkedEventRow {
    payload: serde_json::Value,
}

impl TryFrom<ParkedEventRow> for CallEvent {
    type Error = DomainError;

    fn try_from(row: ParkedEventRow) -> Result<Self, Self::Error> {
        serde_json::from_value(row.payload)
            .map_err(|e| DomainError::Storage(format!("Corrupt parked event: {e}")))
    }
}

#[async_trait]
impl CallRepository for PgCallRepository {
    async fn create(&self, call: &CallRecord) -> Result<Uuid, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO calls (
                id, lead_id, lead_name, lead_phone, kind, remote_call_id, status,
                transcript, call_summary, recording_url, duration_ms,
                disconnection_reason, error_detail, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(call.id)
        .bind(&call.lead_id)
        .bind(&call.lead_name)
        .bind(&call.lead_phone)
        .bind(call.kind.to_string())
        .bind(&call.remote_call_id)
        .bind(call.status.as_str())
        .bind(&call.transcript)
        .bind(&call.call_summary)
        .bind(&call.recording_url)
        .bind(call.duration_ms)
        .bind(&call.disconnection_reason)
        .bind(&call.error_detail)
        .bind(call.created_at)
        .bind(call.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(call.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CallRecord>, DomainError> {
        let row = sqlx::query_as::<_, CallRow>("SELECT * FROM calls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_remote_id(
        &self,
        remote_call_id: &str,
    ) -> Result<Option<CallRecord>, DomainError> {
        let row = sqlx::query_as::<_, CallRow>("SELECT * FROM calls WHERE remote_call_id = $1")
            .bind(remote_call_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update(&self, id: Uuid, mutation: CallMutation) -> Result<UpdatedCall, DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Row lock is held until commit; dropping `tx` on an early return rolls back
        let row = sqlx::query_as::<_, CallRow>("SELECT * FROM calls WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::Storage(format!("Call {} does not exist", id)))?;

        let current: CallRecord = row.try_into()?;
        let mut next = current.clone();
        let changed = mutation(&mut next)?;

        if !changed {
            tx.rollback().await.map_err(storage)?;
            return Ok(UpdatedCall {
                record: current,
                changed,
            });
        }

        let row = sqlx::query_as::<_, CallRow>(
            r#"
            UPDATE calls
            SET remote_call_id = $2, status = $3, transcript = $4, call_summary = $5,
                recording_url = $6, duration_ms = $7, disconnection_reason = $8,
                error_detail = $9, updated_at = $10
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&next.remote_call_id)
        .bind(next.status.as_str())
        .bind(&next.transcript)
        .bind(&next.call_summary)
        .bind(&next.recording_url)
        .bind(next.duration_ms)
        .bind(&next.disconnection_reason)
        .bind(&next.error_detail)
        .bind(next.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(UpdatedCall {
            record: row.try_into()?,
            changed,
        })
    }

    async fn list(&self, limit: Option<i64>) -> Result<Vec<CallRecord>, DomainError> {
        let rows = sqlx::query_as::<_, CallRow>(
            "SELECT * FROM calls ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn park_event(&self, event: &CallEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| DomainError::Storage(format!("Failed to serialize event: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO parked_call_events (remote_call_id, event_kind, payload, received_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&event.remote_call_id)
        .bind(event.kind.to_string())
        .bind(payload)
        .bind(event.received_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn take_parked_events(
        &self,
        remote_call_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, DomainError> {
        let rows = sqlx::query_as::<_, ParkedEventRow>(
            r#"
            DELETE FROM parked_call_events
            WHERE remote_call_id = $1 AND received_at >= $2
            RETURNING payload
            "#,
        )
        .bind(remote_call_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut events = rows
            .into_iter()
            .map(CallEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by_key(|e| e.received_at);
        Ok(events)
    }

    async fn purge_parked_events(&self, before: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM parked_call_events WHERE received_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        Ok(result.rows_affected())
    }
}
