//! Kafka consumer group runner.
//!
//! One runner per (topic, group) binding. Delivery is strictly sequential:
//! message N+1 is not read until the handler for N returned or failed, so a
//! slow handler shows up as consumer lag, never as a blocked publisher.
//! Offsets are stored manually after the delivery decision — that is what
//! makes the group at-least-once (see [`crate::delivery`] for the policy).

use rdkafka::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use tokio::sync::watch;
use tracing::{info, warn};

use tradepost_events::{EventDispatcher, TopicBinding};

use crate::delivery::{DeliveryOutcome, handle_delivery};
use crate::kafka::{KafkaConfig, KafkaInitError};

pub struct ConsumerGroupRunner {
    consumer: StreamConsumer,
    binding: TopicBinding,
}

impl ConsumerGroupRunner {
    /// Join the consumer group and subscribe to the binding's topic.
    pub fn subscribe(config: &KafkaConfig, binding: TopicBinding) -> Result<Self, KafkaInitError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", &config.client_id)
            .set("group.id", &binding.group_id)
            // Offsets are committed in the background but only for
            // positions we explicitly stored after handling.
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;

        consumer.subscribe(&[binding.topic.as_str()])?;

        Ok(Self { consumer, binding })
    }

    pub fn binding(&self) -> &TopicBinding {
        &self.binding
    }

    /// Deliver messages to the dispatcher until shutdown is signalled.
    ///
    /// Transport errors and handler failures are logged and the loop keeps
    /// going; nothing a single message does can take the runner down.
    pub async fn run(&self, dispatcher: &EventDispatcher, mut shutdown: watch::Receiver<bool>) {
        info!(topic = %self.binding.topic, group = %self.binding.group_id, "consumer group runner started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!(topic = %self.binding.topic, group = %self.binding.group_id, "consumer group runner stopping");
                    return;
                }
                received = self.consumer.recv() => {
                    let message = match received {
                        Ok(message) => message,
                        Err(e) => {
                            warn!(topic = %self.binding.topic, error = %e, "consumer receive error");
                            continue;
                        }
                    };

                    let outcome = handle_delivery(
                        dispatcher,
                        message.topic(),
                        message.partition(),
                        message.payload().unwrap_or_default(),
                    );

                    match outcome {
                        DeliveryOutcome::Handled | DeliveryOutcome::DroppedMalformed => {
                            if let Err(e) = self.consumer.store_offset_from_message(&message) {
                                warn!(topic = %self.binding.topic, error = %e, "failed to store offset");
                            }
                        }
                        // Offset withheld; the message is redelivered on
                        // rebalance or restart.
                        DeliveryOutcome::HandlerFailed => {}
                    }
                }
            }
        }
    }
}
