//! End-to-end pipeline over the in-memory backend: orchestrator → bus →
//! delivery → handlers, plus the outbox recovery path.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tradepost_core::{Entity, EntityId, EntityKind};
use tradepost_events::{BrokerRecord, ChangeHandler, EventBus, EventDispatcher, InMemoryEventBus};
use tradepost_infra::{
    DeliveryOutcome, InMemoryEntityStore, InMemoryOutbox, MutationOrchestrator, build_in_memory,
    handle_delivery,
};

type TestOrchestrator = MutationOrchestrator<
    Arc<InMemoryEntityStore>,
    Arc<InMemoryEventBus<BrokerRecord>>,
    Arc<InMemoryOutbox>,
>;

/// Direct wiring without the background forwarder, so record counts on the
/// bus are deterministic.
fn wire() -> (TestOrchestrator, Arc<InMemoryEventBus<BrokerRecord>>) {
    let outbox = Arc::new(InMemoryOutbox::new());
    let store = Arc::new(InMemoryEntityStore::new(outbox.clone()));
    let bus = Arc::new(InMemoryEventBus::new());
    let orchestrator = MutationOrchestrator::new(store, bus.clone(), outbox);
    (orchestrator, bus)
}

/// Read-side mirror keyed by entity id; upserts make replays no-ops.
#[derive(Default)]
struct Mirror {
    entries: RwLock<HashMap<EntityId, Entity>>,
}

impl Mirror {
    fn snapshot(&self) -> HashMap<EntityId, Entity> {
        self.entries.read().unwrap().clone()
    }
}

impl ChangeHandler for Mirror {
    fn on_created(&self, entity: &Entity) -> anyhow::Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(())
    }

    fn on_updated(&self, entity: &Entity) -> anyhow::Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(entity.id, entity.clone());
        Ok(())
    }

    fn on_deleted(&self, _kind: EntityKind, id: EntityId) -> anyhow::Result<()> {
        self.entries.write().unwrap().remove(&id);
        Ok(())
    }
}

#[tokio::test]
async fn mutations_flow_through_the_wired_services_to_the_mirror() {
    // Full wiring, forwarder included, as a front-end process runs it.
    let services = build_in_memory();
    let bus = services.bus.clone().unwrap();
    let subscription = bus.subscribe();

    let mirror = Arc::new(Mirror::default());
    let dispatcher = EventDispatcher::new()
        .register(EntityKind::Supplier, mirror.clone())
        .register(EntityKind::Product, mirror.clone());

    let created = services
        .orchestrator
        .create(EntityKind::Supplier, "Acme", "bolts")
        .await
        .unwrap();
    services
        .orchestrator
        .update(EntityKind::Supplier, created.entity.id, "Acme Corp", "bolts")
        .await
        .unwrap();

    for _ in 0..2 {
        let record = subscription.try_recv().unwrap();
        assert_eq!(record.topic, "supplier-events");
        let outcome = handle_delivery(&dispatcher, &record.topic, 0, &record.payload);
        assert_eq!(outcome, DeliveryOutcome::Handled);
    }

    let snapshot = mirror.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[&created.entity.id].name, "Acme Corp");

    services.shutdown().await;
}

#[tokio::test]
async fn redelivered_created_event_does_not_corrupt_the_mirror() {
    let (orchestrator, bus) = wire();
    let subscription = bus.subscribe();

    let mirror = Arc::new(Mirror::default());
    let dispatcher = EventDispatcher::new().register(EntityKind::Supplier, mirror.clone());

    orchestrator
        .create(EntityKind::Supplier, "Acme", "bolts")
        .await
        .unwrap();

    let record = subscription.try_recv().unwrap();
    // At-least-once: the same message arrives twice.
    handle_delivery(&dispatcher, &record.topic, 0, &record.payload);
    handle_delivery(&dispatcher, &record.topic, 0, &record.payload);

    assert_eq!(mirror.snapshot().len(), 1);
}

#[tokio::test]
async fn delete_event_clears_the_mirror_and_replay_stays_clean() {
    let (orchestrator, bus) = wire();
    let subscription = bus.subscribe();

    let mirror = Arc::new(Mirror::default());
    let dispatcher = EventDispatcher::new().register(EntityKind::Product, mirror.clone());

    let created = orchestrator
        .create(EntityKind::Product, "Bolt", "M6")
        .await
        .unwrap();
    orchestrator
        .delete(EntityKind::Product, created.entity.id)
        .await
        .unwrap();

    let mut records = Vec::new();
    while let Ok(record) = subscription.try_recv() {
        records.push(record);
    }
    assert_eq!(records.len(), 2);

    for record in &records {
        handle_delivery(&dispatcher, &record.topic, 0, &record.payload);
    }
    assert!(mirror.snapshot().is_empty());

    // Replaying the delete is a no-op.
    handle_delivery(&dispatcher, &records[1].topic, 0, &records[1].payload);
    assert!(mirror.snapshot().is_empty());
}

#[tokio::test]
async fn poison_message_does_not_stop_the_stream() {
    let (orchestrator, bus) = wire();
    let subscription = bus.subscribe();

    let mirror = Arc::new(Mirror::default());
    let dispatcher = EventDispatcher::new().register(EntityKind::Supplier, mirror.clone());

    orchestrator
        .create(EntityKind::Supplier, "Acme", "bolts")
        .await
        .unwrap();

    let poison = handle_delivery(&dispatcher, "supplier-events", 0, b"\xff\xfe garbage");
    assert_eq!(poison, DeliveryOutcome::DroppedMalformed);

    let record = subscription.try_recv().unwrap();
    let outcome = handle_delivery(&dispatcher, &record.topic, 0, &record.payload);
    assert_eq!(outcome, DeliveryOutcome::Handled);
    assert_eq!(mirror.snapshot().len(), 1);
}
