//! Kafka-backed transport (behind the `kafka` cargo feature).
//!
//! One producer and one consumer per process; both are built from
//! [`KafkaConfig`] at startup and live for the process lifetime.

pub mod consumer;
pub mod publisher;

pub use consumer::ConsumerGroupRunner;
pub use publisher::KafkaPublisher;

use std::time::Duration;

use tracing::warn;

/// Broker connection settings, read from the environment.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap broker list.
    pub brokers: String,
    pub client_id: String,
    /// Upper bound on one direct publish round trip.
    pub send_timeout: Duration,
}

impl KafkaConfig {
    pub fn from_env(client_id: &str) -> Self {
        let brokers = std::env::var("TRADEPOST_KAFKA_BROKERS").unwrap_or_else(|_| {
            warn!("TRADEPOST_KAFKA_BROKERS not set; using local dev default");
            "localhost:9092".to_string()
        });

        let send_timeout = std::env::var("TRADEPOST_KAFKA_SEND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(5));

        Self {
            brokers,
            client_id: client_id.to_string(),
            send_timeout,
        }
    }
}

/// Failed to construct a Kafka client at startup.
#[derive(Debug, thiserror::Error)]
#[error("kafka client setup failed: {0}")]
pub struct KafkaInitError(#[from] rdkafka::error::KafkaError);
