//! Router Module
//!
//! This module connects the event bus to the handlers. Each consumed channel
//! gets one task that decodes deliveries against the channel's schema and
//! calls the matching handler:
//!
//! | Channel | Handler |
//! |---|---|
//! | `claim-identifier` | [`IntakeHandler::handle`] |
//! | `create-next-batch.request` | [`BatchBuilder::handle_request`] |
//! | `anchoring.confirmation` | re-published as `complete-hashes.request` |
//! | `complete-hashes.request` | [`CompletionSaga::complete_hashes`] |
//!
//! Handler errors are logged here and never leave the task, so one bad
//! delivery can't stop a channel. Deliveries on one channel are handled one
//! at a time; channels run independently of each other.


use crate::{
    batch::BatchBuilder,
    bus::{Channel, Delivery, Event, EventBus, Subscription},
    error::{BatchWriterError, Result},
    intake::IntakeHandler,
    saga::CompletionSaga,
    types::BatchPayload,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace};

/// Channels the router consumes.
pub const CONSUMED: [Channel; 4] = [
    Channel::ClaimIdentifier,
    Channel::CreateNextBatchRequest,
    Channel::AnchoringConfirmation,
    Channel::CompleteHashesRequest,
];

/// Transport adapter for every inbound and internal channel
#[derive(Clone)]
pub struct Router {
    bus: Arc<dyn EventBus>,
    intake: Arc<IntakeHandler>,
    builder: Arc<BatchBuilder>,
    saga: Arc<CompletionSaga>,
}

impl Router {
    pub fn new(
        bus: Arc<dyn EventBus>,
        intake: Arc<IntakeHandler>,
        builder: Arc<BatchBuilder>,
        saga: Arc<CompletionSaga>,
    ) -> Self {
        Self {
            bus,
            intake,
            builder,
            saga,
        }
    }

    /// Subscribe to every consumed channel and spawn one consumer task per channel.
    pub async fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::with_capacity(CONSUMED.len());
        for channel in CONSUMED {
            let subscription = self.bus.subscribe(channel).await?;
            let router = self.clone();
            handles.push(tokio::spawn(router.consume(subscription)));
        }
        info!("router started");
        Ok(handles)
    }

    async fn consume(self, mut subscription: Subscription) {
        while let Some(delivery) = subscription.next().await {
            if let Err(e) = self.dispatch(&delivery).await {
                error!(channel = %delivery.channel, error = %e, "handler failed");
            }
        }
        trace!(channel = %subscription.channel(), "subscription closed");
    }

    /// Decode one delivery and run its handler to completion.
    pub async fn dispatch(&self, delivery: &Delivery) -> Result<()> {
        match delivery.decode()? {
            Event::ClaimIdentifier(claim) => self.intake.handle(claim).await.map(|_| ()),
            Event::CreateNextBatchRequest => self.builder.handle_request().await,
            Event::AnchoringConfirmation(payload) => self.on_anchoring_confirmation(payload).await,
            Event::CompleteHashesRequest(payload) => {
                self.saga.complete_hashes(payload).await;
                Ok(())
            }
            other => Err(BatchWriterError::bus(format!(
                "no handler for {}",
                other.channel()
            ))),
        }
    }

    /// Routing step: hand the confirmation to the saga's own channel unchanged.
    async fn on_anchoring_confirmation(&self, payload: BatchPayload) -> Result<()> {
        trace!(directory = %payload.directory_reference, "routing anchoring confirmation");
        self.bus
            .publish_event(&Event::CompleteHashesRequest(payload))
            .await
    }
}
