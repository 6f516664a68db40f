//! gRPC services per entity kind over the shared mutation orchestrator.

pub mod service;

/// Generated protobuf/tonic code.
pub mod proto {
    tonic::include_proto!("tradepost.catalog.v1");
}

pub use service::{ProductGrpc, SupplierGrpc};
