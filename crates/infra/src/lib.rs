//! Infrastructure-backed implementations of the change pipeline.
//!
//! The pure mechanics live in `tradepost-events`; this crate supplies the
//! pieces that touch the outside world and the orchestration that ties
//! them together:
//!
//! - `store`: the entity store (system of record), in-memory and Postgres
//! - `outbox`: the durable event ledger written with each mutation, plus
//!   the forwarder that drains it to the broker
//! - `publisher`: the direct publish contract and its in-memory impl
//! - `orchestrator`: the persist-then-publish mutation pipeline every
//!   front end calls into
//! - `delivery`: the consumer-side decode→dispatch→commit decision
//! - `kafka` (feature `kafka`): rdkafka-backed publisher and consumer
//!   group runner
//! - `bootstrap`: process wiring from environment configuration

pub mod bootstrap;
pub mod delivery;
pub mod orchestrator;
pub mod outbox;
pub mod publisher;
pub mod store;

#[cfg(feature = "kafka")]
pub mod kafka;

pub use bootstrap::{Services, SharedOrchestrator, build_from_env, build_in_memory};
pub use delivery::{DeliveryOutcome, handle_delivery};
pub use orchestrator::{MutationError, MutationOrchestrator, MutationOutcome, PublishReceipt};
pub use outbox::forwarder::{ForwarderConfig, ForwarderHandle, OutboxForwarder, RetryPolicy};
pub use outbox::{InMemoryOutbox, OutboxEntry, OutboxError, OutboxStore, PgOutbox};
pub use publisher::{EventPublisher, PublishError};
pub use store::{Committed, EntityStore, InMemoryEntityStore, PgConfig, PgEntityStore, StoreError};
