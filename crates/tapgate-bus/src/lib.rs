//! Transport seam between tapgate and its publish/subscribe broker.
//!
//! The core never talks to a broker client directly; it consumes the
//! [`MessageBus`] trait, which exposes subscribe, publish, and a stream of
//! [`BusEvent`]s carrying both inbound messages and connection lifecycle
//! transitions. The ingestion service reacts to `Connected` by
//! (re)registering its subscriptions, which keeps registration an
//! explicit, idempotent startup step rather than a side effect of process
//! configuration.
//!
//! [`MemoryBus`] is the in-process implementation: a broker with the same
//! single-level wildcard routing as the real transport, used by the test
//! suites and the loopback demo binary. A broker-backed implementation
//! plugs in by implementing the same trait.

#![allow(async_fn_in_trait)]

pub mod memory;

pub use memory::{MemoryBroker, MemoryBus};

use tapgate_protocol::TopicFilter;
use thiserror::Error;

/// One inbound message: the concrete topic it arrived on plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Event delivered to a bus consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// Connection to the broker established (or re-established). Any
    /// previously held subscriptions are gone and must be re-registered.
    Connected,

    /// Connection to the broker lost. Messages published by peers while
    /// disconnected are not replayed.
    Disconnected,

    /// The broker confirmed a subscription.
    SubscribeAck(TopicFilter),

    /// An inbound message matching one of this consumer's filters.
    Message(BusMessage),
}

/// Errors surfaced by a bus implementation.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Not connected to broker")]
    NotConnected,

    #[error("Subscribe to '{filter}' failed: {message}")]
    Subscribe { filter: String, message: String },

    #[error("Publish to '{topic}' failed: {message}")]
    Publish { topic: String, message: String },
}

pub type BusResult<T> = Result<T, BusError>;

/// A client connection to the publish/subscribe broker.
///
/// Implementations are cheap to clone; clones share the same underlying
/// connection and inbox, so publishing handles can be handed to multiple
/// owners while a single task drains events.
pub trait MessageBus: Clone + Send + Sync {
    /// Register a subscription for this consumer.
    ///
    /// Subscribing to a filter that is already registered is a harmless
    /// no-op; the broker acknowledges either way.
    ///
    /// # Errors
    /// Returns `BusError::Subscribe` if the broker rejects the request or
    /// the connection is down.
    async fn subscribe(&self, filter: &TopicFilter) -> BusResult<()>;

    /// Publish a payload to a concrete topic, fire-and-forget.
    ///
    /// # Errors
    /// Returns `BusError::Publish` if the broker could not take the
    /// message. Callers report this as a boolean outcome; nothing retries.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Wait for the next event for this consumer.
    ///
    /// Returns `None` once the connection is closed for good.
    async fn recv(&self) -> Option<BusEvent>;
}
