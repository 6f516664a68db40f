//! GraphQL endpoint mirroring the REST surface over the same orchestrator.

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ID, Object, Result, Schema, SimpleObject};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::Extension;

use tradepost_core::{Entity, EntityId, EntityKind};
use tradepost_infra::MutationError;

use crate::app::services::AppServices;

pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(services: Arc<AppServices>) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .finish()
}

pub async fn graphql_handler(
    Extension(schema): Extension<CatalogSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

#[derive(SimpleObject)]
pub struct GqlSupplier {
    pub id: ID,
    pub name: String,
    pub description: String,
}

#[derive(SimpleObject)]
pub struct GqlProduct {
    pub id: ID,
    pub name: String,
    pub description: String,
}

impl From<Entity> for GqlSupplier {
    fn from(entity: Entity) -> Self {
        Self {
            id: ID(entity.id.to_string()),
            name: entity.name,
            description: entity.description,
        }
    }
}

impl From<Entity> for GqlProduct {
    fn from(entity: Entity) -> Self {
        Self {
            id: ID(entity.id.to_string()),
            name: entity.name,
            description: entity.description,
        }
    }
}

fn services<'a>(ctx: &'a Context<'a>) -> &'a Arc<AppServices> {
    ctx.data_unchecked::<Arc<AppServices>>()
}

fn parse_id(id: &ID) -> Result<EntityId> {
    id.0.parse::<EntityId>()
        .map_err(|e| async_graphql::Error::new(e.to_string()))
}

async fn fetch(ctx: &Context<'_>, kind: EntityKind, id: ID) -> Result<Option<Entity>> {
    match services(ctx).orchestrator.get(kind, parse_id(&id)?).await {
        Ok(entity) => Ok(Some(entity)),
        Err(MutationError::NotFound) => Ok(None),
        Err(e) => Err(async_graphql::Error::new(e.to_string())),
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn supplier(&self, ctx: &Context<'_>, id: ID) -> Result<Option<GqlSupplier>> {
        Ok(fetch(ctx, EntityKind::Supplier, id).await?.map(Into::into))
    }

    async fn suppliers(&self, ctx: &Context<'_>) -> Result<Vec<GqlSupplier>> {
        let entities = services(ctx)
            .orchestrator
            .list(EntityKind::Supplier)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn product(&self, ctx: &Context<'_>, id: ID) -> Result<Option<GqlProduct>> {
        Ok(fetch(ctx, EntityKind::Product, id).await?.map(Into::into))
    }

    async fn products(&self, ctx: &Context<'_>) -> Result<Vec<GqlProduct>> {
        let entities = services(ctx)
            .orchestrator
            .list(EntityKind::Product)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(entities.into_iter().map(Into::into).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_supplier(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
    ) -> Result<GqlSupplier> {
        let outcome = services(ctx)
            .orchestrator
            .create(EntityKind::Supplier, &name, &description)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(outcome.entity.into())
    }

    async fn update_supplier(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: String,
        description: String,
    ) -> Result<GqlSupplier> {
        let outcome = services(ctx)
            .orchestrator
            .update(EntityKind::Supplier, parse_id(&id)?, &name, &description)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(outcome.entity.into())
    }

    async fn delete_supplier(&self, ctx: &Context<'_>, id: ID) -> Result<String> {
        services(ctx)
            .orchestrator
            .delete(EntityKind::Supplier, parse_id(&id)?)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok("supplier deleted".to_string())
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: String,
    ) -> Result<GqlProduct> {
        let outcome = services(ctx)
            .orchestrator
            .create(EntityKind::Product, &name, &description)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(outcome.entity.into())
    }

    async fn update_product(
        &self,
        ctx: &Context<'_>,
        id: ID,
        name: String,
        description: String,
    ) -> Result<GqlProduct> {
        let outcome = services(ctx)
            .orchestrator
            .update(EntityKind::Product, parse_id(&id)?, &name, &description)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(outcome.entity.into())
    }

    async fn delete_product(&self, ctx: &Context<'_>, id: ID) -> Result<String> {
        services(ctx)
            .orchestrator
            .delete(EntityKind::Product, parse_id(&id)?)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok("product deleted".to_string())
    }
}
