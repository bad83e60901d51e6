//! In-process event bus.
//!
//! Every publish is copied to each live subscriber of the channel. A publish
//! with no subscribers is dropped, the same as an exchange with no bound queue.

use super::{Channel, EventBus, Subscription};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::trace;

/// Fan-out bus backed by unbounded tokio channels
#[derive(Default)]
pub struct InMemoryBus {
    /// Live subscriber queues per channel, protected by a read-write lock
    subscribers: RwLock<HashMap<Channel, Vec<mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers on a channel.
    #[cfg(test)]
    pub async fn subscriber_count(&self, channel: Channel) -> usize {
        let subscribers = self.subscribers.read().await;
        subscribers
            .get(&channel)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> Result<()> {
        let mut subscribers = self.subscribers.write().await;
        if let Some(senders) = subscribers.get_mut(&channel) {
            // Dropped subscriptions are pruned as a side effect of the send.
            senders.retain(|tx| tx.send(payload.clone()).is_ok());
            trace!(channel = %channel, receivers = senders.len(), "published");
        } else {
            trace!(channel = %channel, "published with no subscribers");
        }
        Ok(())
    }

    async fn subscribe(&self, channel: Channel) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.write().await;
        subscribers.entry(channel).or_default().push(tx);
        Ok(Subscription::new(channel, rx))
    }
}
