//! Claim intake.
//!
//! Stores each claimed identifier as a pending claim. Intake is silent: it
//! publishes nothing, and a failed write is only reported to the caller (the
//! router logs it). Redelivery, if any, is left to the transport.

use crate::error::Result;
use crate::store::ClaimStore;
use crate::types::{ClaimEntry, ClaimIdentifier};
use std::sync::Arc;
use tracing::debug;

pub struct IntakeHandler {
    store: Arc<dyn ClaimStore>,
}

impl IntakeHandler {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store }
    }

    /// Record one claim. Exactly one store write.
    pub async fn handle(&self, claim: ClaimIdentifier) -> Result<ClaimEntry> {
        let entry = self.store.insert(&claim.identifier).await?;
        debug!(identifier = %entry.identifier, "claim recorded");
        Ok(entry)
    }
}
