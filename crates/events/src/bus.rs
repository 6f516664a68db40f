//! Event transport abstraction (mechanics only).
//!
//! The bus is the in-process stand-in for a broker: publish fans a message
//! out to every subscriber. It makes minimal assumptions:
//!
//! - **Transport-agnostic**: in-memory channels here, Kafka in `tradepost-infra`.
//! - **At-least-once acceptable**: consumers must be idempotent.
//! - **No persistence**: the entity store is the system of record; the
//!   stream is a derived notification channel.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use tradepost_core::EntityKind;

use crate::codec::{EncodeError, encode};
use crate::event::ChangeEvent;
use crate::topics::topic_for;

/// One message as it travels to/over a broker: target topic, partition
/// key, and the encoded envelope bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

impl BrokerRecord {
    /// Encode an event and route it to its kind's topic.
    ///
    /// The key is the entity id, so all events for one entity land on one
    /// partition and arrive in order.
    pub fn from_event(event: &ChangeEvent) -> Result<Self, EncodeError> {
        Ok(Self {
            topic: topic_for(event.kind).to_string(),
            key: event.entity_id().to_string(),
            payload: encode(event)?,
        })
    }

    pub fn kind(&self) -> Option<EntityKind> {
        crate::topics::kind_for_topic(&self.topic)
    }
}

/// A subscription to a message stream.
///
/// Designed for single-threaded consumption: one subscription, one
/// consumer loop. Messages arrive in publish order.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Message-agnostic pub/sub bus.
///
/// `publish()` can fail (bus closed, broker away); failures surface to the
/// caller, which decides whether they are fatal — for this system they
/// never are, because the store write has already committed.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
