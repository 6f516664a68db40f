//! Entity store abstractions (system of record).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryEntityStore;
pub use postgres::{PgConfig, PgEntityStore};

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use tradepost_core::{Entity, EntityDraft, EntityId, EntityKind};
use tradepost_events::ChangeEvent;

/// Persistence failure taxonomy.
///
/// `NotFound` is a normal outcome of mutating/reading an absent id;
/// `Unavailable` is an I/O failure and fatal to the request.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Result of a committed mutation.
///
/// The post-mutation entity is returned because the event payload is
/// built from it (notably on update). `outbox_id` identifies the ledger
/// row appended in the same transaction; the orchestrator marks it
/// published when the direct publish succeeds.
#[derive(Debug, Clone)]
pub struct Committed {
    pub entity: Entity,
    pub event: ChangeEvent,
    pub outbox_id: Uuid,
}

/// Durable per-kind document persistence.
///
/// Owns canonical state; callers receive copies. Every mutation appends
/// the encoded change event to the outbox ledger atomically with the
/// entity write — the store commit either carries both or neither.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create(&self, kind: EntityKind, draft: EntityDraft) -> Result<Committed, StoreError>;

    async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Entity, StoreError>;

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError>;

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        draft: EntityDraft,
    ) -> Result<Committed, StoreError>;

    /// Removes the entity, returning its last state. A second delete of
    /// the same id fails with `NotFound` (no silent success).
    async fn delete(&self, kind: EntityKind, id: EntityId) -> Result<Committed, StoreError>;
}

#[async_trait]
impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    async fn create(&self, kind: EntityKind, draft: EntityDraft) -> Result<Committed, StoreError> {
        (**self).create(kind, draft).await
    }

    async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Entity, StoreError> {
        (**self).get(kind, id).await
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        (**self).list(kind).await
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        draft: EntityDraft,
    ) -> Result<Committed, StoreError> {
        (**self).update(kind, id, draft).await
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> Result<Committed, StoreError> {
        (**self).delete(kind, id).await
    }
}
