//! Consumer-side delivery decision: decode, dispatch, decide the offset.
//!
//! Kept free of any broker client so the policy is testable on raw bytes.

use tracing::{debug, error, warn};

use tradepost_events::{EventDispatcher, codec};

/// What the runner should do with the message's offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handlers succeeded; commit the offset.
    Handled,
    /// The payload can never decode; commit the offset so the partition
    /// does not wedge on a poison message.
    DroppedMalformed,
    /// A handler failed; do not commit, the message may be redelivered.
    HandlerFailed,
}

/// Process one delivered message.
pub fn handle_delivery(
    dispatcher: &EventDispatcher,
    topic: &str,
    partition: i32,
    payload: &[u8],
) -> DeliveryOutcome {
    let event = match codec::decode(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(topic, partition, error = %e, "dropping undecodable message");
            return DeliveryOutcome::DroppedMalformed;
        }
    };

    match dispatcher.dispatch(&event) {
        Ok(()) => {
            debug!(topic, partition, event_type = %event.event_type, entity_id = %event.entity_id(), "event handled");
            DeliveryOutcome::Handled
        }
        Err(e) => {
            error!(topic, partition, error = %e, "event handler failed; offset withheld");
            DeliveryOutcome::HandlerFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tradepost_core::{Entity, EntityId, EntityKind};
    use tradepost_events::{ChangeEvent, ChangeHandler, encode};

    #[derive(Default)]
    struct Probe {
        handled: AtomicU32,
        fail: bool,
    }

    impl ChangeHandler for Probe {
        fn on_created(&self, _entity: &Entity) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("downstream write failed");
            }
            self.handled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_updated(&self, _entity: &Entity) -> anyhow::Result<()> {
            Ok(())
        }

        fn on_deleted(&self, _kind: EntityKind, _id: EntityId) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn created_payload() -> Vec<u8> {
        encode(&ChangeEvent::created(Entity {
            id: EntityId::new(),
            kind: EntityKind::Supplier,
            name: "Acme".to_string(),
            description: "bolts".to_string(),
        }))
        .unwrap()
    }

    #[test]
    fn well_formed_message_is_handled_and_committed() {
        let probe = Arc::new(Probe::default());
        let dispatcher = EventDispatcher::new().register(EntityKind::Supplier, probe.clone());

        let outcome = handle_delivery(&dispatcher, "supplier-events", 0, &created_payload());
        assert_eq!(outcome, DeliveryOutcome::Handled);
        assert_eq!(probe.handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_message_is_dropped_with_offset_committed() {
        let dispatcher = EventDispatcher::new();
        let outcome = handle_delivery(&dispatcher, "supplier-events", 0, b"not json at all");
        assert_eq!(outcome, DeliveryOutcome::DroppedMalformed);
    }

    #[test]
    fn handler_failure_withholds_the_offset() {
        let probe = Arc::new(Probe {
            fail: true,
            ..Default::default()
        });
        let dispatcher = EventDispatcher::new().register(EntityKind::Supplier, probe);

        let outcome = handle_delivery(&dispatcher, "supplier-events", 0, &created_payload());
        assert_eq!(outcome, DeliveryOutcome::HandlerFailed);
    }

    #[test]
    fn unknown_event_type_is_handled_as_a_drop_not_a_failure() {
        let dispatcher = EventDispatcher::new();
        let raw = serde_json::json!({
            "schema": 1,
            "eventType": "archived",
            "entityKind": "supplier",
            "payload": { "id": EntityId::new().to_string() },
        });

        let outcome = handle_delivery(&dispatcher, "supplier-events", 0, raw.to_string().as_bytes());
        assert_eq!(outcome, DeliveryOutcome::Handled);
    }
}
