//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{ExplorationEvent, TransactionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Mining scheduler lifecycle and discovered chunks
    Exploration,
    /// On-chain transaction lifecycle
    Transaction,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Exploration(ExplorationEvent),
    Transaction(TransactionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Exploration(_) => Topic::Exploration,
            Event::Transaction(_) => Topic::Transaction,
        }
    }
}

struct Channels {
    exploration: broadcast::Sender<Event>,
    transaction: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Exploration => &self.exploration,
            Topic::Transaction => &self.transaction,
        }
    }
}

/// Topic-based event bus
///
/// Consumers subscribe to the topics they care about. Delivery is
/// best-effort: lagging receivers lose the oldest events.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                exploration: broadcast::channel(capacity).0,
                transaction: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
