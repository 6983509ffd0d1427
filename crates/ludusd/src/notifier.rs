//! Notification fan-out - best-effort delivery toward UI and dashboards.
//!
//! Delivery must never block or fail the request that produced the event;
//! problems are logged and swallowed here.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use ludus_common::EventNotifier;

/// A published notification as seen by subscribers.
#[derive(Debug, Clone)]
pub struct Notification {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Broadcast-channel event bus. Subscribers that fall behind lose messages;
/// at-most-once-best-effort is the contract.
pub struct EventBus {
    tx: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventNotifier for EventBus {
    fn publish(&self, topic: &str, payload: serde_json::Value) {
        debug!("notify {topic}");
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(Notification {
            topic: topic.to_string(),
            payload,
        });
    }
}

/// Notifier that drops everything. Handy default for tests.
pub struct NullNotifier;

impl EventNotifier for NullNotifier {
    fn publish(&self, _topic: &str, _payload: serde_json::Value) {}
}

/// Serialize and publish a typed payload, swallowing serialization failures.
pub fn emit<T: Serialize>(notifier: &dyn EventNotifier, topic: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => notifier.publish(topic, value),
        Err(e) => warn!("Dropped {topic} notification: {e}"),
    }
}
