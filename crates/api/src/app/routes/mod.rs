use axum::Router;

pub mod common;
pub mod products;
pub mod suppliers;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/suppliers", suppliers::router())
        .nest("/products", products::router())
}
