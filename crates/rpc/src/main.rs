use std::sync::Arc;

use tonic::transport::Server;

use tradepost_rpc::proto::product_service_server::ProductServiceServer;
use tradepost_rpc::proto::supplier_service_server::SupplierServiceServer;
use tradepost_rpc::{ProductGrpc, SupplierGrpc};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tradepost_observability::init();

    let services = Arc::new(tradepost_infra::build_from_env("tradepost-rpc").await?);

    let addr = std::env::var("TRADEPOST_RPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50053".to_string())
        .parse()?;

    tracing::info!(%addr, "gRPC services listening");

    Server::builder()
        .add_service(SupplierServiceServer::new(SupplierGrpc::new(services.clone())))
        .add_service(ProductServiceServer::new(ProductGrpc::new(services)))
        .serve(addr)
        .await?;

    Ok(())
}
