//! Outbound Event Forwarder
//!
//! Subscribes to every outbound channel and POSTs each payload to
//! `<forward_url>/events/<channel>`, where the downstream anchoring process
//! (or anything else) picks it up. Delivery is best effort: failures are
//! logged and the event is not retried.

use super::{Channel, EventBus};
use crate::error::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// HTTP pusher for outbound events
pub struct Forwarder {
    bus: Arc<dyn EventBus>,
    client: reqwest::Client,
    base_url: String,
}

impl Forwarder {
    /// Creates a forwarder
    ///
    /// # Arguments
    /// * `bus` - Bus to take outbound events from
    /// * `base_url` - Downstream endpoint, without the `/events/...` suffix
    pub fn new(bus: Arc<dyn EventBus>, base_url: impl Into<String>) -> Self {
        Self {
            bus,
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, channel: Channel) -> String {
        format!("{}/events/{}", self.base_url, channel.name())
    }

    /// Subscribe to the outbound channels and spawn one delivery task per channel.
    ///
    /// The returned handles run until the bus drops the subscriptions.
    pub async fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();
        for channel in Channel::outbound() {
            let mut subscription = self.bus.subscribe(channel).await?;
            let client = self.client.clone();
            let endpoint = self.endpoint(channel);

            handles.push(tokio::spawn(async move {
                while let Some(delivery) = subscription.next().await {
                    let response = client
                        .post(&endpoint)
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(delivery.payload)
                        .send()
                        .await;

                    match response {
                        Ok(resp) if resp.status().is_success() => {
                            debug!(channel = %channel, "forwarded outbound event");
                        }
                        Ok(resp) => {
                            warn!(channel = %channel, status = %resp.status(), "downstream rejected outbound event");
                        }
                        Err(e) => {
                            warn!(channel = %channel, error = %e, "failed to forward outbound event");
                        }
                    }
                }
            }));
        }
        Ok(handles)
    }
}
