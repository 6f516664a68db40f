//! Postgres-backed entity store.
//!
//! Entities live in a plain document table; each mutation inserts its
//! encoded change event into `event_outbox` within the same transaction,
//! so a committed entity write always carries its ledger row.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use tradepost_core::{Entity, EntityDraft, EntityId, EntityKind};
use tradepost_events::{BrokerRecord, ChangeEvent};

use crate::store::{Committed, EntityStore, StoreError};

/// Connection settings, read from the environment.
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PgConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            warn!("DATABASE_URL not set; using local dev default");
            "postgres://localhost:5432/tradepost".to_string()
        });

        let max_connections = std::env::var("TRADEPOST_PG_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Self {
            database_url,
            max_connections,
        }
    }

    pub async fn connect(&self) -> Result<PgPool, StoreError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(&self.database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables/indexes if missing. Run once at process start.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id UUID PRIMARY KEY,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS entities_kind_idx ON entities (kind)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_outbox (
                id UUID PRIMARY KEY,
                topic TEXT NOT NULL,
                key TEXT NOT NULL,
                payload BYTEA NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                next_attempt_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                published_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS event_outbox_unpublished_idx \
             ON event_outbox (next_attempt_at) WHERE published_at IS NULL",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn commit_with_outbox(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        entity: Entity,
        event: ChangeEvent,
    ) -> Result<Committed, StoreError> {
        let record =
            BrokerRecord::from_event(&event).map_err(|e| StoreError::Internal(e.to_string()))?;
        let outbox_id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO event_outbox (id, topic, key, payload, created_at, next_attempt_at) \
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(outbox_id)
        .bind(&record.topic)
        .bind(&record.key)
        .bind(&record.payload)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Committed {
            entity,
            event,
            outbox_id,
        })
    }
}

fn row_to_entity(row: &PgRow) -> Result<Entity, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let kind = EntityKind::from_str(&kind)
        .map_err(|_| StoreError::Internal(format!("unknown stored kind: {kind}")))?;

    Ok(Entity {
        id: EntityId::from_uuid(id),
        kind,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn create(&self, kind: EntityKind, draft: EntityDraft) -> Result<Committed, StoreError> {
        let entity = draft.into_entity(EntityId::new(), kind);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO entities (id, kind, name, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(entity.id.as_uuid())
        .bind(kind.as_str())
        .bind(&entity.name)
        .bind(&entity.description)
        .execute(&mut *tx)
        .await?;

        self.commit_with_outbox(tx, entity.clone(), ChangeEvent::created(entity))
            .await
    }

    async fn get(&self, kind: EntityKind, id: EntityId) -> Result<Entity, StoreError> {
        let row = sqlx::query(
            "SELECT id, kind, name, description FROM entities WHERE id = $1 AND kind = $2",
        )
        .bind(id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        row_to_entity(&row)
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Entity>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, kind, name, description FROM entities WHERE kind = $1 ORDER BY id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entity).collect()
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: EntityId,
        draft: EntityDraft,
    ) -> Result<Committed, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "UPDATE entities SET name = $1, description = $2, updated_at = now() \
             WHERE id = $3 AND kind = $4 \
             RETURNING id, kind, name, description",
        )
        .bind(draft.name())
        .bind(draft.description())
        .bind(id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let entity = row_to_entity(&row)?;
        self.commit_with_outbox(tx, entity.clone(), ChangeEvent::updated(entity))
            .await
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> Result<Committed, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "DELETE FROM entities WHERE id = $1 AND kind = $2 \
             RETURNING id, kind, name, description",
        )
        .bind(id.as_uuid())
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound)?;

        let entity = row_to_entity(&row)?;
        self.commit_with_outbox(tx, entity, ChangeEvent::deleted(kind, id))
            .await
    }
}
