//! In-memory entity store for tests/dev.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use tradepost_core::{Entity, EntityDraft, EntityId, EntityKind};
use tradepost_events::{BrokerRecord, ChangeEvent};

use crate::outbox::InMemoryOutbox;
use crate::store::{Committed, EntityStore, StoreError};

/// In-memory document store paired with an in-memory outbox.
///
/// The write lock spans both the entity map update and the outbox append,
/// standing in for the shared transaction of the Postgres implementation.
/// BTreeMap keyed by (kind, id) keeps listings in creation order (ids are
/// time-ordered UUIDv7).
#[derive(Debug)]
pub struct InMemoryEntityStore {
    entities: RwLock<BTreeMap<(EntityKind, EntityId), Entity>>,
    outbox: Arc<InMemoryOutbox>,
}

impl InMemoryEntityStore {
    pub fn new(outbox: Arc<InMemoryOutbox>) -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            outbox,
        }
    }

    pub fn outbox(&self) -> Arc<InMemoryOutbox> {
        self.outbox.clone()
    }

    fn commit(&self, entity: Entity, event: ChangeEvent) -> Result<Committed, StoreError> {
        let record =
            BrokerRecord::from_event(&event).map_err(|e| StoreError::Internal(e.to_string()))?;
        let outbox_id = self.outbox.append(record);
        Ok(Committed {
            entity,
            event,
            outbox_id,
        })
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn create(&self, kind: EntityKind, draft: EntityDraft) -> Result<Committed, StoreError> {
        let entity = draft.into_entity(EntityId::new(), kind);

        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(|e| e.into_inner());
        entities.insert((kind, entity.id), entity.clone());

        self.commit(entity.clone(), ChangeEvent::created(entity))
    }

    async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Entity, StoreError> {
        self.entities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(kind, id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .entities
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .range((kind, EntityId::from_uuid(uuid::Uuid::nil()))..)
            .take_while(|((k, _), _)| *k == kind)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        draft: EntityDraft,
    ) -> Result<Committed, StoreError> {
        let mut entities = self
            .entities
            .write()
            .unwrap_or_else(|e| e.into_inner());

        let entry = entities.get_mut(&(kind, id)).ok_or(StoreError::NotFound)?;
        entry.name = draft.name().to_string();
        entry.description = draft.description().to_string();
        let entity = entry.clone();
        drop(entities);

        self.commit(entity.clone(), ChangeEvent::updated(entity))
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> Result<Committed, StoreError> {
        let removed = self
            .entities
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(kind, id))
            .ok_or(StoreError::NotFound)?;

        self.commit(removed, ChangeEvent::deleted(kind, id))
    }
}
