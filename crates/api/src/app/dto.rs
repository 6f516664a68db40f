use serde::Deserialize;

use tradepost_core::Entity;
use tradepost_infra::{MutationOutcome, PublishReceipt};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateEntityRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntityRequest {
    pub name: String,
    pub description: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn entity_to_json(entity: &Entity) -> serde_json::Value {
    serde_json::json!({
        "id": entity.id.to_string(),
        "kind": entity.kind.as_str(),
        "name": entity.name,
        "description": entity.description,
    })
}

/// Mutation responses carry the committed entity plus the notification
/// status, so "saved" and "saved but the change event is delayed" stay
/// distinguishable without ever failing the request.
pub fn mutation_to_json(outcome: &MutationOutcome) -> serde_json::Value {
    let mut body = entity_to_json(&outcome.entity);

    body["publish"] = match &outcome.receipt {
        PublishReceipt::Delivered => serde_json::json!({ "delivered": true }),
        PublishReceipt::Deferred { reason } => serde_json::json!({
            "delivered": false,
            "detail": format!("change event delivery deferred: {reason}"),
        }),
    };

    body
}
