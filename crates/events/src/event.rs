//! The change-event model shared by producer and consumer sides.

use serde::{Deserialize, Serialize};

use tradepost_core::{Entity, EntityId, EntityKind};

/// What happened to an entity.
///
/// `Unknown` carries event-type strings this build does not recognize.
/// The codec passes them through so the dispatcher can log and drop them
/// instead of failing the whole message (newer producers may emit types
/// older consumers have never heard of).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Deleted => "deleted",
            EventType::Unknown(s) => s,
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => EventType::Created,
            "updated" => EventType::Updated,
            "deleted" => EventType::Deleted,
            _ => EventType::Unknown(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

/// Payload of a change event.
///
/// Created/Updated carry the full post-mutation entity; Deleted carries
/// the identity only (there is no entity left to describe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Entity(Entity),
    Ref(EntityId),
}

impl EventPayload {
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            EventPayload::Entity(e) => Some(e),
            EventPayload::Ref(_) => None,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        match self {
            EventPayload::Entity(e) => e.id,
            EventPayload::Ref(id) => *id,
        }
    }
}

/// A change notification for one committed store mutation.
///
/// Built once per successful mutation, immutable afterwards, transported
/// as an opaque serialized blob over the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub event_type: EventType,
    pub kind: EntityKind,
    pub payload: EventPayload,
}

impl ChangeEvent {
    pub fn created(entity: Entity) -> Self {
        Self {
            event_type: EventType::Created,
            kind: entity.kind,
            payload: EventPayload::Entity(entity),
        }
    }

    pub fn updated(entity: Entity) -> Self {
        Self {
            event_type: EventType::Updated,
            kind: entity.kind,
            payload: EventPayload::Entity(entity),
        }
    }

    pub fn deleted(kind: EntityKind, id: EntityId) -> Self {
        Self {
            event_type: EventType::Deleted,
            kind,
            payload: EventPayload::Ref(id),
        }
    }

    /// Identity of the entity the event is about (partitioning key).
    pub fn entity_id(&self) -> EntityId {
        self.payload.entity_id()
    }
}
