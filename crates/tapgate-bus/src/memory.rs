//! In-process broker for tests and the loopback demo.
//!
//! `MemoryBroker` routes published messages to every connected client with
//! a matching filter, mirroring the single-level `+` wildcard semantics of
//! the real transport. `interrupt()` simulates a broker reconnect: clients
//! lose their subscriptions and receive `Disconnected` followed by
//! `Connected`, which is exactly the situation the ingestion service must
//! survive by re-subscribing.

use crate::{BusError, BusEvent, BusMessage, BusResult, MessageBus};
use std::sync::{Arc, Mutex, atomic::AtomicBool, atomic::Ordering};
use tapgate_protocol::TopicFilter;
use tokio::sync::mpsc;
use tracing::{debug, trace};

struct ClientState {
    client_id: String,
    filters: Vec<TopicFilter>,
    tx: mpsc::UnboundedSender<BusEvent>,
}

#[derive(Default)]
struct BrokerState {
    clients: Vec<ClientState>,
}

/// In-memory publish/subscribe broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    fail_publishes: Arc<AtomicBool>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new client. The client immediately receives
    /// [`BusEvent::Connected`] in its inbox.
    #[must_use]
    pub fn connect(&self, client_id: &str) -> MemoryBus {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(BusEvent::Connected).ok();

        let mut state = self.state.lock().expect("broker lock poisoned");
        state.clients.push(ClientState {
            client_id: client_id.to_string(),
            filters: Vec::new(),
            tx: tx.clone(),
        });
        debug!(client_id, "memory bus client connected");

        MemoryBus {
            client_id: client_id.to_string(),
            broker: self.clone(),
            tx,
            rx: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    /// Simulate a broker bounce: every client loses its subscriptions and
    /// observes `Disconnected` then `Connected`.
    pub fn interrupt(&self) {
        let mut state = self.state.lock().expect("broker lock poisoned");
        for client in &mut state.clients {
            client.filters.clear();
            client.tx.send(BusEvent::Disconnected).ok();
            client.tx.send(BusEvent::Connected).ok();
        }
        debug!("memory bus interrupted; all subscriptions dropped");
    }

    /// Make subsequent publishes fail (test hook for the fire-and-forget
    /// publish outcome paths).
    pub fn set_fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    fn route(&self, topic: &str, payload: &[u8]) -> BusResult<usize> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(BusError::Publish {
                topic: topic.to_string(),
                message: "broker rejected message".to_string(),
            });
        }

        let state = self.state.lock().expect("broker lock poisoned");
        let mut delivered = 0;
        for client in &state.clients {
            if client.filters.iter().any(|f| f.matches(topic)) {
                let message = BusMessage {
                    topic: topic.to_string(),
                    payload: payload.to_vec(),
                };
                if client.tx.send(BusEvent::Message(message)).is_ok() {
                    delivered += 1;
                }
            }
        }
        trace!(topic, delivered, "memory bus routed message");
        Ok(delivered)
    }

    fn add_filter(&self, client_id: &str, filter: &TopicFilter) -> BusResult<()> {
        let mut state = self.state.lock().expect("broker lock poisoned");
        let client = state
            .clients
            .iter_mut()
            .find(|c| c.client_id == client_id)
            .ok_or(BusError::NotConnected)?;

        if !client.filters.contains(filter) {
            client.filters.push(filter.clone());
        }
        client.tx.send(BusEvent::SubscribeAck(filter.clone())).ok();
        Ok(())
    }
}

/// A client connection to a [`MemoryBroker`].
///
/// Clones share the same inbox; hand clones to publishing call sites and
/// let one task drain `recv`.
#[derive(Clone)]
pub struct MemoryBus {
    client_id: String,
    broker: MemoryBroker,
    tx: mpsc::UnboundedSender<BusEvent>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<BusEvent>>>,
}

impl MemoryBus {
    /// Identifier this client connected with.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Inject a raw event into this client's inbox (test hook).
    pub fn inject(&self, event: BusEvent) {
        self.tx.send(event).ok();
    }
}

impl MessageBus for MemoryBus {
    async fn subscribe(&self, filter: &TopicFilter) -> BusResult<()> {
        self.broker.add_filter(&self.client_id, filter)
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> BusResult<()> {
        self.broker.route(topic, &payload)?;
        Ok(())
    }

    async fn recv(&self) -> Option<BusEvent> {
        self.rx.lock().await.recv().await
    }
}
