//! In-process change feed backed by a broadcast channel

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ChangeEvent, ChangeFeed, FeedFilter, Subscription, BROADCAST_CAPACITY};
use crate::error::DeskResult;

/// Feed that fans out events published by the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// Publishes an event to every live subscription
    pub fn publish(&self, event: ChangeEvent) {
        // no receivers is fine
        let _ = self.sender.send(event);
    }

    /// Number of live forwarding tasks
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl ChangeFeed for MemoryFeed {
    async fn subscribe(&self, filter: FeedFilter) -> DeskResult<Subscription> {
        tracing::debug!(table = %filter.table, column = ?filter.column_eq, "Subscribed to memory feed");
        Ok(Subscription::forward(self.sender.subscribe(), filter))
    }
}
