//! Consumer-side routing of decoded events to handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use tradepost_core::{Entity, EntityId, EntityKind};

use crate::event::{ChangeEvent, EventPayload, EventType};

/// Side effects applied from the event stream for one entity kind.
///
/// Handlers run under at-least-once delivery and **must be idempotent**:
/// applying the same `(event type, payload)` twice has to leave downstream
/// state as if it were applied once. The usual shape is an upsert/remove
/// keyed by entity id. This is a system-wide invariant, not a per-handler
/// choice.
pub trait ChangeHandler: Send + Sync {
    fn on_created(&self, entity: &Entity) -> anyhow::Result<()>;

    fn on_updated(&self, entity: &Entity) -> anyhow::Result<()>;

    fn on_deleted(&self, kind: EntityKind, id: EntityId) -> anyhow::Result<()>;
}

/// A handler raised an error; the message may be redelivered.
#[derive(Debug, thiserror::Error)]
#[error("handler failed for {event_type} {kind}: {source}")]
pub struct DispatchError {
    pub kind: EntityKind,
    pub event_type: EventType,
    #[source]
    pub source: anyhow::Error,
}

/// Routes a decoded event by entity kind and event type.
///
/// Unrecognized event types (and kinds nobody registered for) are logged
/// at warning level and dropped — never fatal, never retried.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<EntityKind, Arc<dyn ChangeHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: EntityKind, handler: Arc<dyn ChangeHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn dispatch(&self, event: &ChangeEvent) -> Result<(), DispatchError> {
        let Some(handler) = self.handlers.get(&event.kind) else {
            warn!(kind = %event.kind, event_type = %event.event_type, "no handler registered for kind; dropping event");
            return Ok(());
        };

        let result = match (&event.event_type, &event.payload) {
            (EventType::Created, EventPayload::Entity(entity)) => handler.on_created(entity),
            (EventType::Updated, EventPayload::Entity(entity)) => handler.on_updated(entity),
            (EventType::Deleted, payload) => handler.on_deleted(event.kind, payload.entity_id()),
            (EventType::Unknown(ty), _) => {
                warn!(kind = %event.kind, event_type = %ty, "event type not recognized; dropping event");
                return Ok(());
            }
            // A created/updated event without a full entity cannot pass the
            // codec; treat it like a malformed message if built by hand.
            (ty, EventPayload::Ref(id)) => {
                warn!(kind = %event.kind, event_type = %ty, entity_id = %id, "event missing entity payload; dropping");
                return Ok(());
            }
        };

        result.map_err(|source| DispatchError {
            kind: event.kind,
            event_type: event.event_type.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        created: AtomicU32,
        updated: AtomicU32,
        deleted: AtomicU32,
        fail: bool,
    }

    impl ChangeHandler for CountingHandler {
        fn on_created(&self, _entity: &Entity) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("boom");
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_updated(&self, _entity: &Entity) -> anyhow::Result<()> {
            self.updated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_deleted(&self, _kind: EntityKind, _id: EntityId) -> anyhow::Result<()> {
            self.deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn supplier(name: &str) -> Entity {
        Entity {
            id: EntityId::new(),
            kind: EntityKind::Supplier,
            name: name.to_string(),
            description: "bolts".to_string(),
        }
    }

    #[test]
    fn routes_by_kind_and_event_type() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher =
            EventDispatcher::new().register(EntityKind::Supplier, handler.clone());

        let entity = supplier("Acme");
        dispatcher.dispatch(&ChangeEvent::created(entity.clone())).unwrap();
        dispatcher.dispatch(&ChangeEvent::updated(entity.clone())).unwrap();
        dispatcher
            .dispatch(&ChangeEvent::deleted(EntityKind::Supplier, entity.id))
            .unwrap();

        assert_eq!(handler.created.load(Ordering::SeqCst), 1);
        assert_eq!(handler.updated.load(Ordering::SeqCst), 1);
        assert_eq!(handler.deleted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_event_type_is_dropped_not_fatal() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher =
            EventDispatcher::new().register(EntityKind::Supplier, handler.clone());

        let event = ChangeEvent {
            event_type: EventType::Unknown("archived".to_string()),
            kind: EntityKind::Supplier,
            payload: EventPayload::Ref(EntityId::new()),
        };

        dispatcher.dispatch(&event).unwrap();
        assert_eq!(handler.created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregistered_kind_is_dropped_not_fatal() {
        let dispatcher = EventDispatcher::new();
        dispatcher
            .dispatch(&ChangeEvent::created(supplier("Acme")))
            .unwrap();
    }

    #[test]
    fn handler_failure_surfaces_as_dispatch_error() {
        let handler = Arc::new(CountingHandler {
            fail: true,
            ..Default::default()
        });
        let dispatcher = EventDispatcher::new().register(EntityKind::Supplier, handler);

        let err = dispatcher
            .dispatch(&ChangeEvent::created(supplier("Acme")))
            .unwrap_err();
        assert_eq!(err.kind, EntityKind::Supplier);
        assert_eq!(err.event_type, EventType::Created);
    }
}
