//! rdkafka-backed direct publisher.

use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::debug;

use tradepost_events::BrokerRecord;

use crate::kafka::{KafkaConfig, KafkaInitError};
use crate::publisher::{EventPublisher, PublishError};

/// Shared per-process producer; clone is cheap (inner Arc).
#[derive(Clone)]
pub struct KafkaPublisher {
    producer: FutureProducer,
    send_timeout: Timeout,
}

impl KafkaPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaInitError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", config.send_timeout.as_millis().to_string())
            .create()?;

        Ok(Self {
            producer,
            send_timeout: Timeout::After(config.send_timeout),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, record: BrokerRecord) -> Result<(), PublishError> {
        let delivery = self
            .producer
            .send(
                FutureRecord::to(&record.topic)
                    .key(&record.key)
                    .payload(&record.payload),
                self.send_timeout,
            )
            .await;

        match delivery {
            Ok((partition, offset)) => {
                debug!(topic = %record.topic, partition, offset, "event published");
                Ok(())
            }
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => {
                Err(PublishError::Timeout)
            }
            Err((e, _)) => Err(PublishError::BrokerUnavailable(e.to_string())),
        }
    }
}
