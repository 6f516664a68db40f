//! Service implementations: thin adapters from gRPC requests onto the
//! orchestrator. Store failures become error statuses; publish failures
//! never do — they surface as `event_delivered: false` on the response.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use tradepost_core::{Entity, EntityId, EntityKind};
use tradepost_infra::{MutationError, Services};

use crate::proto::{
    CreateProductRequest, CreateSupplierRequest, DeleteProductRequest, DeleteProductResponse,
    DeleteSupplierRequest, DeleteSupplierResponse, GetProductRequest, GetSupplierRequest, Product,
    ProductResponse, SearchProductsRequest, SearchProductsResponse, SearchSuppliersRequest,
    SearchSuppliersResponse, Supplier, SupplierResponse, UpdateProductRequest,
    UpdateSupplierRequest, product_service_server::ProductService,
    supplier_service_server::SupplierService,
};

fn status_from(err: MutationError) -> Status {
    match err {
        MutationError::Validation(msg) => Status::invalid_argument(msg),
        MutationError::NotFound => Status::not_found("not found"),
        MutationError::Store(e) => Status::unavailable(e.to_string()),
    }
}

fn parse_id(raw: &str) -> Result<EntityId, Status> {
    raw.parse()
        .map_err(|_| Status::invalid_argument(format!("invalid id: {raw}")))
}

fn to_supplier(entity: &Entity) -> Supplier {
    Supplier {
        id: entity.id.to_string(),
        name: entity.name.clone(),
        description: entity.description.clone(),
    }
}

fn to_product(entity: &Entity) -> Product {
    Product {
        id: entity.id.to_string(),
        name: entity.name.clone(),
        description: entity.description.clone(),
    }
}

#[derive(Clone)]
pub struct SupplierGrpc {
    services: Arc<Services>,
}

impl SupplierGrpc {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[tonic::async_trait]
impl SupplierService for SupplierGrpc {
    async fn get_supplier(
        &self,
        request: Request<GetSupplierRequest>,
    ) -> Result<Response<SupplierResponse>, Status> {
        let id = parse_id(&request.into_inner().supplier_id)?;
        let entity = self
            .services
            .orchestrator
            .get(EntityKind::Supplier, id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SupplierResponse {
            supplier: Some(to_supplier(&entity)),
            event_delivered: true,
        }))
    }

    async fn search_suppliers(
        &self,
        _request: Request<SearchSuppliersRequest>,
    ) -> Result<Response<SearchSuppliersResponse>, Status> {
        let entities = self
            .services
            .orchestrator
            .list(EntityKind::Supplier)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SearchSuppliersResponse {
            suppliers: entities.iter().map(to_supplier).collect(),
        }))
    }

    async fn create_supplier(
        &self,
        request: Request<CreateSupplierRequest>,
    ) -> Result<Response<SupplierResponse>, Status> {
        let req = request.into_inner();
        let outcome = self
            .services
            .orchestrator
            .create(EntityKind::Supplier, &req.name, &req.description)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SupplierResponse {
            supplier: Some(to_supplier(&outcome.entity)),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }

    async fn update_supplier(
        &self,
        request: Request<UpdateSupplierRequest>,
    ) -> Result<Response<SupplierResponse>, Status> {
        let req = request.into_inner();
        let id = parse_id(&req.supplier_id)?;
        let outcome = self
            .services
            .orchestrator
            .update(EntityKind::Supplier, id, &req.name, &req.description)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SupplierResponse {
            supplier: Some(to_supplier(&outcome.entity)),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }

    async fn delete_supplier(
        &self,
        request: Request<DeleteSupplierRequest>,
    ) -> Result<Response<DeleteSupplierResponse>, Status> {
        let id = parse_id(&request.into_inner().supplier_id)?;
        let outcome = self
            .services
            .orchestrator
            .delete(EntityKind::Supplier, id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(DeleteSupplierResponse {
            message: "supplier deleted".to_string(),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }
}

#[derive(Clone)]
pub struct ProductGrpc {
    services: Arc<Services>,
}

impl ProductGrpc {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

#[tonic::async_trait]
impl ProductService for ProductGrpc {
    async fn get_product(
        &self,
        request: Request<GetProductRequest>,
    ) -> Result<Response<ProductResponse>, Status> {
        let id = parse_id(&request.into_inner().product_id)?;
        let entity = self
            .services
            .orchestrator
            .get(EntityKind::Product, id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(ProductResponse {
            product: Some(to_product(&entity)),
            event_delivered: true,
        }))
    }

    async fn search_products(
        &self,
        _request: Request<SearchProductsRequest>,
    ) -> Result<Response<SearchProductsResponse>, Status> {
        let entities = self
            .services
            .orchestrator
            .list(EntityKind::Product)
            .await
            .map_err(status_from)?;

        Ok(Response::new(SearchProductsResponse {
            products: entities.iter().map(to_product).collect(),
        }))
    }

    async fn create_product(
        &self,
        request: Request<CreateProductRequest>,
    ) -> Result<Response<ProductResponse>, Status> {
        let req = request.into_inner();
        let outcome = self
            .services
            .orchestrator
            .create(EntityKind::Product, &req.name, &req.description)
            .await
            .map_err(status_from)?;

        Ok(Response::new(ProductResponse {
            product: Some(to_product(&outcome.entity)),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }

    async fn update_product(
        &self,
        request: Request<UpdateProductRequest>,
    ) -> Result<Response<ProductResponse>, Status> {
        let req = request.into_inner();
        let id = parse_id(&req.product_id)?;
        let outcome = self
            .services
            .orchestrator
            .update(EntityKind::Product, id, &req.name, &req.description)
            .await
            .map_err(status_from)?;

        Ok(Response::new(ProductResponse {
            product: Some(to_product(&outcome.entity)),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }

    async fn delete_product(
        &self,
        request: Request<DeleteProductRequest>,
    ) -> Result<Response<DeleteProductResponse>, Status> {
        let id = parse_id(&request.into_inner().product_id)?;
        let outcome = self
            .services
            .orchestrator
            .delete(EntityKind::Product, id)
            .await
            .map_err(status_from)?;

        Ok(Response::new(DeleteProductResponse {
            message: "product deleted".to_string(),
            event_delivered: outcome.receipt.is_delivered(),
        }))
    }
}
