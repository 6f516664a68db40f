//! Mutation execution pipeline (application-level orchestration).
//!
//! Every front end (REST, GraphQL, gRPC) calls into this one pipeline.
//! A request moves through validate → persist → publish:
//!
//! ```text
//! draft validation        -> fails the request (nothing touched the store)
//! store mutation + outbox -> fails the request (nothing was published)
//! direct publish          -> NEVER fails the request; a broker failure is
//!                            logged, the outbox row stays for the forwarder,
//!                            and the caller sees success with a deferred
//!                            delivery receipt
//! ```
//!
//! The asymmetry is load-bearing: the store is the system of record, the
//! event stream is a derived notification channel. Callers must be able to
//! distinguish "your data was not saved" from "your data was saved but the
//! notification may be delayed", so the publish result is part of the
//! success value rather than an error.

use tracing::{instrument, warn};

use tradepost_core::{DomainError, Entity, EntityDraft, EntityId, EntityKind};
use tradepost_events::BrokerRecord;

use crate::outbox::OutboxStore;
use crate::publisher::EventPublisher;
use crate::store::{Committed, EntityStore, StoreError};

/// Terminal failures of a mutation request.
///
/// Publish failures are absent by design; see the module docs.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for MutationError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => MutationError::Validation(msg),
            DomainError::InvalidId(msg) => MutationError::Validation(msg),
            DomainError::NotFound => MutationError::NotFound,
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => MutationError::NotFound,
            other => MutationError::Store(other),
        }
    }
}

/// How the change notification left the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReceipt {
    /// The broker acknowledged the direct publish.
    Delivered,
    /// The direct publish failed; the outbox forwarder will deliver it.
    Deferred { reason: String },
}

impl PublishReceipt {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishReceipt::Delivered)
    }
}

/// A successful mutation: the committed entity plus the delivery receipt.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub entity: Entity,
    pub receipt: PublishReceipt,
}

/// Sequences persist-then-publish for every mutation in the system.
///
/// Generic over store/publisher/outbox so tests wire in-memory parts and
/// processes wire Postgres/Kafka, with identical behavior.
#[derive(Debug)]
pub struct MutationOrchestrator<S, P, O> {
    store: S,
    publisher: P,
    outbox: O,
}

impl<S, P, O> MutationOrchestrator<S, P, O> {
    pub fn new(store: S, publisher: P, outbox: O) -> Self {
        Self {
            store,
            publisher,
            outbox,
        }
    }
}

impl<S, P, O> MutationOrchestrator<S, P, O>
where
    S: EntityStore,
    P: EventPublisher,
    O: OutboxStore,
{
    #[instrument(skip(self, name, description), fields(kind = %kind))]
    pub async fn create(
        &self,
        kind: EntityKind,
        name: &str,
        description: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let draft = EntityDraft::new(name, description)?;
        let committed = self.store.create(kind, draft).await?;
        Ok(self.publish_committed(committed).await)
    }

    #[instrument(skip(self, name, description), fields(kind = %kind, id = %id))]
    pub async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        name: &str,
        description: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let draft = EntityDraft::new(name, description)?;
        let committed = self.store.update(kind, id, draft).await?;
        Ok(self.publish_committed(committed).await)
    }

    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub async fn delete(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> Result<MutationOutcome, MutationError> {
        let committed = self.store.delete(kind, id).await?;
        Ok(self.publish_committed(committed).await)
    }

    pub async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Entity, MutationError> {
        Ok(self.store.get(kind, id).await?)
    }

    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, MutationError> {
        Ok(self.store.list(kind).await?)
    }

    /// Publish after the commit. Infallible by contract: the mutation is
    /// already durable, so every failure path degrades to a deferred
    /// receipt instead of an error.
    async fn publish_committed(&self, committed: Committed) -> MutationOutcome {
        let Committed {
            entity,
            event,
            outbox_id,
        } = committed;

        let record = match BrokerRecord::from_event(&event) {
            Ok(record) => record,
            Err(e) => {
                warn!(entity_id = %entity.id, error = %e, "event encoding failed; delivery deferred to forwarder");
                return MutationOutcome {
                    entity,
                    receipt: PublishReceipt::Deferred {
                        reason: e.to_string(),
                    },
                };
            }
        };

        match self.publisher.publish(record).await {
            Ok(()) => {
                // The ledger row served its purpose; if this mark fails the
                // forwarder republishes and consumers deduplicate.
                if let Err(e) = self.outbox.mark_published(&[outbox_id]).await {
                    warn!(outbox_id = %outbox_id, error = %e, "could not mark outbox row published");
                }
                MutationOutcome {
                    entity,
                    receipt: PublishReceipt::Delivered,
                }
            }
            Err(e) => {
                warn!(
                    entity_id = %entity.id,
                    event_type = %event.event_type,
                    error = %e,
                    "publish failed after commit; outbox forwarder will deliver"
                );
                MutationOutcome {
                    entity,
                    receipt: PublishReceipt::Deferred {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}
