//! Completion Saga Module
//!
//! Final step of a batch's life: once the anchoring process has confirmed a
//! directory, its claims are marked complete and the outcome is announced.
//!
//! `complete_hashes` is the single place completion happens. It can be called
//! from the router (for `complete-hashes.request` deliveries) or in-process.
//! Marking is idempotent, so a redelivered confirmation changes nothing and
//! announces nothing a second time. A confirmation whose marking failed is
//! completed by the next delivery of the same confirmation.

use crate::{
    bus::{Event, EventBus},
    store::ClaimStore,
    types::{BatchPayload, CompleteHashesFailure, Confirmation},
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What a call to `complete_hashes` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Claims marked complete and `complete-hashes.success` published.
    Completed {
        /// Claims whose `completed_at` this call set.
        newly_completed: u64,
    },
    /// The batch was already confirmed; nothing published.
    Duplicate,
    /// Marking or announcing failed; `complete-hashes.failure` was attempted.
    Failed {
        error: String,
    },
}

pub struct CompletionSaga {
    store: Arc<dyn ClaimStore>,
    bus: Arc<dyn EventBus>,
}

impl CompletionSaga {
    pub fn new(store: Arc<dyn ClaimStore>, bus: Arc<dyn EventBus>) -> Self {
        Self { store, bus }
    }

    /// Mark every identifier in `payload` complete and publish exactly one terminal event.
    ///
    /// Never returns an error; failures are reported through
    /// `complete-hashes.failure` and the returned outcome.
    pub async fn complete_hashes(&self, payload: BatchPayload) -> CompletionOutcome {
        debug!(
            directory = %payload.directory_reference,
            claims = payload.identifiers.len(),
            "Mark hashes complete request"
        );

        let newly_completed = match self.store.mark_complete(&payload.identifiers).await {
            Ok(changed) => changed,
            Err(e) => return self.fail(e.to_string(), payload).await,
        };

        let confirmation = match self.store.confirm_batch(&payload.directory_reference).await {
            Ok(confirmation) => confirmation,
            Err(e) => return self.fail(e.to_string(), payload).await,
        };

        if newly_completed == 0 && confirmation == Confirmation::AlreadyConfirmed {
            debug!(directory = %payload.directory_reference, "batch already confirmed");
            return CompletionOutcome::Duplicate;
        }

        let directory = payload.directory_reference.clone();
        match self.bus.publish_event(&Event::CompleteHashesSuccess(payload.clone())).await {
            Ok(()) => {
                info!(directory = %directory, newly_completed, "Mark hashes complete success");
                CompletionOutcome::Completed { newly_completed }
            }
            Err(e) => self.fail(e.to_string(), payload).await,
        }
    }

    async fn fail(&self, error: String, payload: BatchPayload) -> CompletionOutcome {
        error!(
            directory = %payload.directory_reference,
            identifiers = ?payload.identifiers,
            error = %error,
            "Mark hashes complete failure"
        );
        let failure = CompleteHashesFailure::new(error.clone(), payload);
        if let Err(e) = self.bus.publish_event(&Event::CompleteHashesFailure(failure)).await {
            error!(error = %e, "failed to publish complete hashes failure");
        }
        CompletionOutcome::Failed { error }
    }
}
