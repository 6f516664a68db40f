//! Change-event mechanics (pure, no I/O).
//!
//! This crate defines everything about a change notification that does not
//! touch a network or a database: the event model, the versioned wire codec,
//! the kind→topic routing, the consumer-side dispatcher, and an in-process
//! bus for tests/dev. Broker- and store-backed implementations live in
//! `tradepost-infra`.

pub mod bus;
pub mod codec;
pub mod dispatcher;
pub mod event;
pub mod in_memory_bus;
pub mod topics;

pub use bus::{BrokerRecord, EventBus, Subscription};
pub use codec::{DecodeError, EncodeError, decode, encode};
pub use dispatcher::{ChangeHandler, DispatchError, EventDispatcher};
pub use event::{ChangeEvent, EventPayload, EventType};
pub use in_memory_bus::InMemoryEventBus;
pub use topics::{TopicBinding, kind_for_topic, topic_for};
