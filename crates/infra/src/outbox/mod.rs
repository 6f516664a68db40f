//! Durable event ledger (transactional outbox).
//!
//! Every store mutation appends its encoded event here in the same
//! transaction as the entity write. The direct publish path marks the row
//! published on success; rows left behind are drained to the broker by the
//! [`forwarder`], converting the unreliable dual-write into a reliable
//! single-write-plus-async-forward.

pub mod forwarder;
pub mod postgres;

pub use postgres::PgOutbox;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tradepost_events::BrokerRecord;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("outbox unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for OutboxError {
    fn from(value: sqlx::Error) -> Self {
        OutboxError::Unavailable(value.to_string())
    }
}

/// One ledger row: a broker record awaiting (or past) publication.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: Uuid,
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    pub fn record(&self) -> BrokerRecord {
        BrokerRecord {
            topic: self.topic.clone(),
            key: self.key.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Ledger operations used after the mutation transaction committed.
///
/// Appending happens inside the entity store's transaction and is not part
/// of this trait; implementations pair with their store counterpart.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Fetch unpublished rows that are due and still have retry budget,
    /// oldest first. Postgres uses `FOR UPDATE SKIP LOCKED` so concurrent
    /// forwarders never double-claim a row.
    async fn claim_unpublished(
        &self,
        limit: u32,
        max_attempts: u32,
    ) -> Result<Vec<OutboxEntry>, OutboxError>;

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), OutboxError>;

    /// Record a failed publish attempt and when the row becomes due again.
    async fn record_failure(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), OutboxError>;

    /// Delete published rows older than the cutoff; returns rows removed.
    async fn sweep_published(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError>;
}

#[async_trait]
impl<O> OutboxStore for Arc<O>
where
    O: OutboxStore + ?Sized,
{
    async fn claim_unpublished(
        &self,
        limit: u32,
        max_attempts: u32,
    ) -> Result<Vec<OutboxEntry>, OutboxError> {
        (**self).claim_unpublished(limit, max_attempts).await
    }

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), OutboxError> {
        (**self).mark_published(ids).await
    }

    async fn record_failure(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        (**self).record_failure(id, next_attempt_at).await
    }

    async fn sweep_published(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError> {
        (**self).sweep_published(older_than).await
    }
}

/// In-memory ledger for tests/dev, paired with `InMemoryEntityStore`.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    entries: Mutex<Vec<OutboxEntry>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row; the in-memory store calls this while holding its own
    /// write lock, standing in for the shared transaction.
    pub fn append(&self, record: BrokerRecord) -> Uuid {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(OutboxEntry {
            id,
            topic: record.topic,
            key: record.key,
            payload: record.payload,
            attempts: 0,
            created_at: now,
            next_attempt_at: now,
            published_at: None,
        });
        id
    }

    /// Number of rows still awaiting publication.
    pub fn unpublished_len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.published_at.is_none())
            .count()
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutbox {
    async fn claim_unpublished(
        &self,
        limit: u32,
        max_attempts: u32,
    ) -> Result<Vec<OutboxEntry>, OutboxError> {
        let now = Utc::now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .iter()
            .filter(|e| {
                e.published_at.is_none() && e.next_attempt_at <= now && e.attempts < max_attempts
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, ids: &[Uuid]) -> Result<(), OutboxError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries.iter_mut() {
            if ids.contains(&entry.id) {
                entry.published_at = Some(now);
            }
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            entry.next_attempt_at = next_attempt_at;
        }
        Ok(())
    }

    async fn sweep_published(&self, older_than: DateTime<Utc>) -> Result<u64, OutboxError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| match e.published_at {
            Some(at) => at >= older_than,
            None => true,
        });
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str) -> BrokerRecord {
        BrokerRecord {
            topic: topic.to_string(),
            key: "k".to_string(),
            payload: b"{}".to_vec(),
        }
    }

    #[tokio::test]
    async fn claim_skips_published_and_exhausted_rows() {
        let outbox = InMemoryOutbox::new();
        let a = outbox.append(record("supplier-events"));
        let b = outbox.append(record("supplier-events"));
        let c = outbox.append(record("product-events"));

        outbox.mark_published(&[a]).await.unwrap();
        for _ in 0..5 {
            outbox.record_failure(b, Utc::now()).await.unwrap();
        }

        let claimed = outbox.claim_unpublished(10, 5).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, c);
    }

    #[tokio::test]
    async fn backoff_delays_reclaim() {
        let outbox = InMemoryOutbox::new();
        let id = outbox.append(record("supplier-events"));

        outbox
            .record_failure(id, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        assert!(outbox.claim_unpublished(10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_removes_only_old_published_rows() {
        let outbox = InMemoryOutbox::new();
        let a = outbox.append(record("supplier-events"));
        let _b = outbox.append(record("supplier-events"));

        outbox.mark_published(&[a]).await.unwrap();
        let removed = outbox
            .sweep_published(Utc::now() + chrono::Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(outbox.unpublished_len(), 1);
    }
}
