//! Black-box tests over the full HTTP router (in-memory backend).

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use tradepost_api::app::build_app;
use tradepost_infra::build_in_memory;

fn app() -> Router {
    build_app(Arc::new(build_in_memory()))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(json.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_supplier_returns_entity_and_delivery_receipt() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/suppliers",
        Some(serde_json::json!({ "name": "Acme", "description": "bolts" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "supplier");
    assert_eq!(body["name"], "Acme");
    assert!(body["id"].as_str().is_some());
    assert_eq!(body["publish"]["delivered"], true);
}

#[tokio::test]
async fn empty_required_field_is_rejected_before_the_store() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/suppliers",
        Some(serde_json::json!({ "name": "Acme", "description": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, listing) = send(&app, "GET", "/suppliers", None).await;
    assert_eq!(listing["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_id_maps_to_404_and_invalid_id_to_400() {
    let app = app();

    let random = uuid::Uuid::now_v7();
    let (status, body) = send(&app, "GET", &format!("/products/{random}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = send(&app, "GET", "/products/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn full_crud_flow_over_rest() {
    let app = app();

    let (_, created) = send(
        &app,
        "POST",
        "/products",
        Some(serde_json::json!({ "name": "Bolt", "description": "M6" })),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Bolt");

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/products/{id}"),
        Some(serde_json::json!({ "name": "Bolt", "description": "M8 steel" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "M8 steel");

    let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // No silent success on double delete.
    let (status, _) = send(&app, "DELETE", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_on_unknown_id_is_404() {
    let app = app();
    let random = uuid::Uuid::now_v7();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/suppliers/{random}"),
        Some(serde_json::json!({ "name": "Acme Corp", "description": "bolts" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn graphql_mutations_and_queries_share_the_store_with_rest() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/graphql",
        Some(serde_json::json!({
            "query": "mutation { createProduct(name: \"Bolt\", description: \"M6\") { id name description } }"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let created = &body["data"]["createProduct"];
    assert_eq!(created["name"], "Bolt");
    let id = created["id"].as_str().unwrap().to_string();

    // Visible through REST as well: one store behind both gateways.
    let (status, fetched) = send(&app, "GET", &format!("/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["description"], "M6");

    let (_, body) = send(
        &app,
        "POST",
        "/graphql",
        Some(serde_json::json!({
            "query": format!("{{ product(id: \"{id}\") {{ name }} }}")
        })),
    )
    .await;
    assert_eq!(body["data"]["product"]["name"], "Bolt");

    // Absent ids resolve to null rather than an error.
    let random = uuid::Uuid::now_v7();
    let (_, body) = send(
        &app,
        "POST",
        "/graphql",
        Some(serde_json::json!({
            "query": format!("{{ supplier(id: \"{random}\") {{ name }} }}")
        })),
    )
    .await;
    assert!(body["data"]["supplier"].is_null());
}
