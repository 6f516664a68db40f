//! HTTP application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: infrastructure wiring (store/publisher/outbox, orchestrator)
//! - `routes/`: REST routes + handlers (one file per entity kind)
//! - `graphql.rs`: GraphQL schema and endpoint over the same orchestrator
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::post};

pub mod dto;
pub mod errors;
pub mod graphql;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let schema = graphql::build_schema(services.clone());

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .route("/graphql", post(graphql::graphql_handler))
        .layer(Extension(services))
        .layer(Extension(schema))
}
