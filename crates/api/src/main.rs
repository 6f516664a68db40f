use std::sync::Arc;

#[tokio::main]
async fn main() {
    tradepost_observability::init();

    let services = tradepost_api::app::services::build_services()
        .await
        .expect("failed to wire services");

    let app = tradepost_api::app::build_app(Arc::new(services));

    let addr = std::env::var("TRADEPOST_API_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
