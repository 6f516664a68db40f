//! The direct publish contract.

use std::sync::Arc;

use async_trait::async_trait;

use tradepost_events::{BrokerRecord, EventBus, InMemoryEventBus};

/// Broker delivery failure.
///
/// Never fatal to the request that triggered it: the store write has
/// already committed, so callers log a warning and leave redelivery to
/// the outbox forwarder.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("publish timed out")]
    Timeout,
}

/// Delivers one record to the broker topic it names.
///
/// One network round trip to the topic leader; on success the message is
/// durably appended at an offset the caller never observes.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, record: BrokerRecord) -> Result<(), PublishError>;
}

#[async_trait]
impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher + ?Sized,
{
    async fn publish(&self, record: BrokerRecord) -> Result<(), PublishError> {
        (**self).publish(record).await
    }
}

/// The in-process bus doubles as the dev/test publisher.
#[async_trait]
impl EventPublisher for InMemoryEventBus<BrokerRecord> {
    async fn publish(&self, record: BrokerRecord) -> Result<(), PublishError> {
        EventBus::publish(self, record)
            .map_err(|e| PublishError::BrokerUnavailable(format!("{e:?}")))
    }
}
