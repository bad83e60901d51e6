//! Event Bus Module
//!
//! This module defines the message transport the batch writer talks through:
//! - `Channel`: the named channels and their direction
//! - `Event`: typed payload schema per channel
//! - `EventBus`: publish/subscribe seam, at-least-once, no cross-channel ordering
//! - `InMemoryBus`: in-process fan-out implementation
//! - `Forwarder`: pushes outbound events to a downstream HTTP endpoint

mod channel;
mod event;
mod forwarder;
mod memory;

pub use channel::{Channel, Direction};
pub use event::Event;
pub use forwarder::Forwarder;
pub use memory::InMemoryBus;

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A single message taken off a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: Channel,
    pub payload: Vec<u8>,
}

impl Delivery {
    /// Decode the payload against its channel's schema.
    pub fn decode(&self) -> Result<Event> {
        Event::decode(self.channel, &self.payload)
    }
}

/// Receiving end of a channel subscription.
///
/// Dropping it unsubscribes.
pub struct Subscription {
    channel: Channel,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
    pub fn new(channel: Channel, receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { channel, receiver }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Wait for the next delivery; `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<Delivery> {
        let payload = self.receiver.recv().await?;
        Some(Delivery {
            channel: self.channel,
            payload,
        })
    }

    /// Take a delivery only if one is already queued.
    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<Delivery> {
        let payload = self.receiver.try_recv().ok()?;
        Some(Delivery {
            channel: self.channel,
            payload,
        })
    }
}

/// Publish/subscribe transport with named channels.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish raw payload bytes on a channel.
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> Result<()>;

    /// Start receiving every payload published on `channel` from now on.
    async fn subscribe(&self, channel: Channel) -> Result<Subscription>;

    /// Encode a typed event and publish it on its own channel.
    async fn publish_event(&self, event: &Event) -> Result<()> {
        let payload = event.encode()?;
        self.publish(event.channel(), payload).await
    }
}
