//! Postgres-backed outbox ledger, sharing the entity store's pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use uuid::Uuid;

use crate::outbox::{OutboxEntry, OutboxError, OutboxStore};

pub struct PgOutbox {
    pool: PgPool,
}

impl PgOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &PgRow) -> Result<OutboxEntry, OutboxError> {
    let attempts: i32 = row.try_get("attempts")?;
    Ok(OutboxEntry {
        id: row.try_get("id")?,
        topic: row.try_get("topic")?,
        key: row.try_get("key")?,
        payload: row.try_get("payload")?,
        attempts: attempts.max(0) as u32,
        created_at: row.try_get("created_at")?,
        next_attempt_at: row.try_get("next_attempt_at")?,
        published_at: row.try_get("published_at")?,
    })
}

#[async_trait]
impl OutboxStore for PgOutbox {
    async fn claim_unpublished(
        &self,
        limit: u32,
        max_attempts: u32,
    ) -> Result<Vec<OutboxEntry>, OutboxError> {
        // SKIP LOCKED keeps concurrent forwarders off each other's rows.
        let rows = sqlx::query(
            "SELECT id, topic, key, payload, attempts, created_at, next_attempt_at, published_at \
             FROM event_outbox \
             WHERE published_at IS NULL AND next_attempt_at <= now() AND attempts < $1 \
             ORDER BY created_at ASC \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(max_attempts as i32)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), OutboxError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE event_outbox SET published_at = now() WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_failure(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        sqlx::query(
            "UPDATE event_outbox SET attempts = attempts + 1, next_attempt_at = $1 WHERE id = $2",
        )
        .bind(next_attempt_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sweep_published(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError> {
        let result = sqlx::query(
            "DELETE FROM event_outbox WHERE published_at IS NOT NULL AND published_at < $1",
        )
        .bind(older_than)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
