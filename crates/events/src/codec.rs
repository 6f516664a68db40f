//! Versioned wire codec for change events.
//!
//! The wire structs below are deliberately separate from the domain types:
//! field names and enum literals here are the producer/consumer contract
//! and must stay stable even when internal types move. Unknown *extra*
//! fields are ignored (a newer producer may add some); a missing or
//! mistyped *required* field is a shape violation and rejects the message.

use serde::{Deserialize, Serialize};

use tradepost_core::{Entity, EntityKind};

use crate::event::{ChangeEvent, EventPayload, EventType};

/// Current wire schema version. Bump when the shape changes incompatibly.
const WIRE_SCHEMA: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WireEvent {
    schema: u32,
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(rename = "entityKind")]
    entity_kind: String,
    payload: WirePayload,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePayload {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Failed to serialize an event for the wire.
#[derive(Debug, thiserror::Error)]
#[error("event could not be encoded: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// A consumed message did not match the wire contract.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed event payload: {0}")]
    Malformed(String),

    #[error("unsupported wire schema version {0}")]
    UnsupportedSchema(u32),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}

/// Serialize a change event into its wire form.
pub fn encode(event: &ChangeEvent) -> Result<Vec<u8>, EncodeError> {
    let payload = match &event.payload {
        EventPayload::Entity(entity) => WirePayload {
            id: entity.id.to_string(),
            name: Some(entity.name.clone()),
            description: Some(entity.description.clone()),
        },
        EventPayload::Ref(id) => WirePayload {
            id: id.to_string(),
            name: None,
            description: None,
        },
    };

    let wire = WireEvent {
        schema: WIRE_SCHEMA,
        event_type: event.event_type.as_str().to_string(),
        entity_kind: event.kind.as_str().to_string(),
        payload,
    };

    Ok(serde_json::to_vec(&wire)?)
}

/// Decode a wire message back into a change event.
///
/// Unrecognized `eventType` strings decode successfully as
/// [`EventType::Unknown`] and are left to the dispatcher; everything else
/// about the shape is enforced here.
pub fn decode(bytes: &[u8]) -> Result<ChangeEvent, DecodeError> {
    let wire: WireEvent =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if wire.schema != WIRE_SCHEMA {
        return Err(DecodeError::UnsupportedSchema(wire.schema));
    }

    let kind: EntityKind = wire
        .entity_kind
        .parse()
        .map_err(|_| DecodeError::UnknownKind(wire.entity_kind.clone()))?;

    let event_type = EventType::from(wire.event_type);

    let id = wire
        .payload
        .id
        .parse()
        .map_err(|_| DecodeError::Malformed(format!("invalid entity id: {}", wire.payload.id)))?;

    let payload = match event_type {
        EventType::Created | EventType::Updated => {
            let (Some(name), Some(description)) = (wire.payload.name, wire.payload.description)
            else {
                return Err(DecodeError::Malformed(format!(
                    "{event_type} event requires name and description"
                )));
            };
            EventPayload::Entity(Entity {
                id,
                kind,
                name,
                description,
            })
        }
        // Deleted carries identity only; unknown types get the most
        // lenient reading so the dispatcher can still log them.
        EventType::Deleted | EventType::Unknown(_) => EventPayload::Ref(id),
    };

    Ok(ChangeEvent {
        event_type,
        kind,
        payload,
    })
}
