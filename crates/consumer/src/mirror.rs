//! Read-side mirror of the catalog, maintained from the event stream.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::info;

use tradepost_core::{Entity, EntityId, EntityKind};
use tradepost_events::ChangeHandler;

/// Keeps a local copy of every live entity, keyed by id.
///
/// Upsert/remove by key makes the handler naturally idempotent: replaying
/// a `created` or `updated` event rewrites the same value, replaying a
/// `deleted` event removes a key that is already gone. That property is
/// what lets the runner redeliver under at-least-once without corruption.
#[derive(Debug, Default)]
pub struct MirrorHandler {
    entries: RwLock<HashMap<(EntityKind, EntityId), Entity>>,
}

impl MirrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EntityKind, id: EntityId) -> Option<Entity> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(kind, id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChangeHandler for MirrorHandler {
    fn on_created(&self, entity: &Entity) -> anyhow::Result<()> {
        info!(kind = %entity.kind, id = %entity.id, name = %entity.name, "mirroring created entity");
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((entity.kind, entity.id), entity.clone());
        Ok(())
    }

    fn on_updated(&self, entity: &Entity) -> anyhow::Result<()> {
        info!(kind = %entity.kind, id = %entity.id, name = %entity.name, "mirroring updated entity");
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((entity.kind, entity.id), entity.clone());
        Ok(())
    }

    fn on_deleted(&self, kind: EntityKind, id: EntityId) -> anyhow::Result<()> {
        info!(kind = %kind, id = %id, "removing deleted entity from mirror");
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(kind, id));
        Ok(())
    }
}
