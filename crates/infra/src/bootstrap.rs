//! Process wiring: one store, one publisher, one outbox per process.
//!
//! Clients are constructed here once at startup and passed by handle into
//! the orchestrator, front ends, and forwarder; their lifetime is the
//! process lifetime, ended by [`Services::shutdown`].

use std::sync::Arc;

use tracing::{info, warn};

use tradepost_events::{BrokerRecord, InMemoryEventBus};

use crate::orchestrator::MutationOrchestrator;
use crate::outbox::forwarder::{ForwarderConfig, ForwarderHandle, OutboxForwarder};
use crate::outbox::{InMemoryOutbox, OutboxStore};
use crate::publisher::EventPublisher;
use crate::store::{EntityStore, InMemoryEntityStore};

/// The one orchestrator type every front end shares.
pub type SharedOrchestrator =
    MutationOrchestrator<Arc<dyn EntityStore>, Arc<dyn EventPublisher>, Arc<dyn OutboxStore>>;

/// Everything a front-end process needs, wired once.
pub struct Services {
    pub orchestrator: Arc<SharedOrchestrator>,
    pub store: Arc<dyn EntityStore>,
    pub outbox: Arc<dyn OutboxStore>,
    pub publisher: Arc<dyn EventPublisher>,
    /// Present in the in-memory backend only; lets dev tooling and tests
    /// subscribe to the stream inside the process.
    pub bus: Option<Arc<InMemoryEventBus<BrokerRecord>>>,
    forwarder: Option<ForwarderHandle>,
}

impl Services {
    /// Drain the forwarder and release clients.
    pub async fn shutdown(mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.shutdown().await;
        }
    }
}

/// Build services from `TRADEPOST_BACKEND` (`memory` by default, `kafka`
/// for the Postgres + Kafka stack when compiled with the `kafka` feature).
#[cfg_attr(not(feature = "kafka"), allow(unused_variables))]
pub async fn build_from_env(client_id: &str) -> anyhow::Result<Services> {
    let backend = std::env::var("TRADEPOST_BACKEND").unwrap_or_else(|_| {
        warn!("TRADEPOST_BACKEND not set; using in-memory backend");
        "memory".to_string()
    });

    match backend.as_str() {
        "memory" => Ok(build_in_memory()),
        #[cfg(feature = "kafka")]
        "kafka" => build_kafka(client_id).await,
        #[cfg(not(feature = "kafka"))]
        "kafka" => anyhow::bail!(
            "TRADEPOST_BACKEND=kafka requires building with the `kafka` feature"
        ),
        other => anyhow::bail!("unknown TRADEPOST_BACKEND: {other}"),
    }
}

/// In-memory stack: store, outbox, and an in-process bus as the broker.
pub fn build_in_memory() -> Services {
    let outbox = Arc::new(InMemoryOutbox::new());
    let store = Arc::new(InMemoryEntityStore::new(outbox.clone()));
    let bus = Arc::new(InMemoryEventBus::<BrokerRecord>::new());

    let store: Arc<dyn EntityStore> = store;
    let outbox: Arc<dyn OutboxStore> = outbox;
    let publisher: Arc<dyn EventPublisher> = bus.clone();

    let forwarder =
        OutboxForwarder::new(outbox.clone(), publisher.clone(), ForwarderConfig::default())
            .spawn();

    info!("services wired with in-memory backend");

    Services {
        orchestrator: Arc::new(MutationOrchestrator::new(
            store.clone(),
            publisher.clone(),
            outbox.clone(),
        )),
        store,
        outbox,
        publisher,
        bus: Some(bus),
        forwarder: Some(forwarder),
    }
}

#[cfg(feature = "kafka")]
async fn build_kafka(client_id: &str) -> anyhow::Result<Services> {
    use anyhow::Context;

    use crate::kafka::{KafkaConfig, KafkaPublisher};
    use crate::outbox::PgOutbox;
    use crate::store::{PgConfig, PgEntityStore};

    let pool = PgConfig::from_env()
        .connect()
        .await
        .context("connecting to Postgres")?;

    let store = PgEntityStore::new(pool.clone());
    store
        .ensure_schema()
        .await
        .context("preparing store schema")?;

    let kafka_config = KafkaConfig::from_env(client_id);
    let publisher: Arc<dyn EventPublisher> =
        Arc::new(KafkaPublisher::new(&kafka_config).context("creating Kafka producer")?);

    let store: Arc<dyn EntityStore> = Arc::new(store);
    let outbox: Arc<dyn OutboxStore> = Arc::new(PgOutbox::new(pool));

    let forwarder =
        OutboxForwarder::new(outbox.clone(), publisher.clone(), ForwarderConfig::default())
            .spawn();

    info!(brokers = %kafka_config.brokers, "services wired with Postgres + Kafka backend");

    Ok(Services {
        orchestrator: Arc::new(MutationOrchestrator::new(
            store.clone(),
            publisher.clone(),
            outbox.clone(),
        )),
        store,
        outbox,
        publisher,
        bus: None,
        forwarder: Some(forwarder),
    })
}
