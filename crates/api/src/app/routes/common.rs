//! Shared handler bodies, parameterized over the entity kind.
//!
//! The supplier and product routers are the same pipeline pointed at a
//! different kind; only the route prefix differs.

use std::sync::Arc;

use axum::{Json, http::StatusCode, response::IntoResponse};

use tradepost_core::{EntityId, EntityKind};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_entity(
    services: Arc<AppServices>,
    kind: EntityKind,
    body: dto::CreateEntityRequest,
) -> axum::response::Response {
    match services
        .orchestrator
        .create(kind, &body.name, &body.description)
        .await
    {
        Ok(outcome) => (StatusCode::CREATED, Json(dto::mutation_to_json(&outcome))).into_response(),
        Err(e) => errors::mutation_error_to_response(e),
    }
}

pub async fn list_entities(services: Arc<AppServices>, kind: EntityKind) -> axum::response::Response {
    match services.orchestrator.list(kind).await {
        Ok(entities) => {
            let items = entities.iter().map(dto::entity_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::mutation_error_to_response(e),
    }
}

pub async fn get_entity(
    services: Arc<AppServices>,
    kind: EntityKind,
    id: String,
) -> axum::response::Response {
    let Ok(id) = id.parse::<EntityId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid entity id");
    };

    match services.orchestrator.get(kind, id).await {
        Ok(entity) => (StatusCode::OK, Json(dto::entity_to_json(&entity))).into_response(),
        Err(e) => errors::mutation_error_to_response(e),
    }
}

pub async fn update_entity(
    services: Arc<AppServices>,
    kind: EntityKind,
    id: String,
    body: dto::UpdateEntityRequest,
) -> axum::response::Response {
    let Ok(id) = id.parse::<EntityId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid entity id");
    };

    match services
        .orchestrator
        .update(kind, id, &body.name, &body.description)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(dto::mutation_to_json(&outcome))).into_response(),
        Err(e) => errors::mutation_error_to_response(e),
    }
}

pub async fn delete_entity(
    services: Arc<AppServices>,
    kind: EntityKind,
    id: String,
) -> axum::response::Response {
    let Ok(id) = id.parse::<EntityId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid entity id");
    };

    match services.orchestrator.delete(kind, id).await {
        Ok(outcome) => (StatusCode::OK, Json(dto::mutation_to_json(&outcome))).into_response(),
        Err(e) => errors::mutation_error_to_response(e),
    }
}
