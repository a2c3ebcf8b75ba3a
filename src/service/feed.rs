//! Typed publish/subscribe channel announcing receipt writes to open views.

use tokio::sync::broadcast;
use tracing::debug;

use crate::types::receipt::StoreKind;

const FEED_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptEvent {
    Added { id: String, source: StoreKind },
}

/// Change notifications for one store. Each successful write publishes once.
#[derive(Debug, Clone)]
pub struct ReceiptFeed {
    sender: broadcast::Sender<ReceiptEvent>,
}

impl ReceiptFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender: tx }
    }

    pub fn publish(&self, event: ReceiptEvent) {
        debug!(?event, subscribers = self.sender.receiver_count(), "publishing receipt event");
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ReceiptEvent> {
        self.sender.subscribe()
    }
}

impl Default for ReceiptFeed {
    fn default() -> Self {
        Self::new()
    }
}
