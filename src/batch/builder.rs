//! Batch Builder Module
//!
//! This module turns every pending claim into one directory artifact and
//! announces the result.
//!
//! # Build Flow
//! 1. Snapshot every claim without `completed_at`, in store order (no reservation)
//! 2. Ask the directory service for an empty directory, then add the claimed files
//! 3. Record the built batch in the ledger, unless it is empty
//! 4. Publish `create-next-batch.success` with the identifiers and reference
//!
//! Any failure in steps 1-3 publishes `create-next-batch.failure` instead.
//! No step writes to a claim, so a failed build leaves every claim as it was.
//! Claims stay pending until a confirmation completes them, so a batch whose
//! confirmation never arrives is simply selected again by a later build.

use crate::{
    bus::{Event, EventBus},
    directory::DirectoryService,
    error::Result,
    store::ClaimStore,
    types::{Batch, BatchFailure},
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Batch builder
///
/// Handles `create-next-batch.request` events.
pub struct BatchBuilder {
    /// Claim store to snapshot pending claims from
    store: Arc<dyn ClaimStore>,
    /// Directory service that materializes the batch
    directory: Arc<dyn DirectoryService>,
    /// Bus the outcome is published on
    bus: Arc<dyn EventBus>,
}

impl BatchBuilder {
    /// Creates a new batch builder
    ///
    /// # Arguments
    /// * `store` - Shared claim store
    /// * `directory` - Directory service used to group the claims
    /// * `bus` - Event bus for the success/failure events
    pub fn new(
        store: Arc<dyn ClaimStore>,
        directory: Arc<dyn DirectoryService>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            store,
            directory,
            bus,
        }
    }

    /// Handle one build request
    ///
    /// Builds the next batch and publishes the outcome. Build failures become a
    /// failure event; the only error returned is a failure to publish.
    pub async fn handle_request(&self) -> Result<()> {
        debug!("Create next batch request");

        let batch = match self.create_next_batch().await {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Create next batch failure");
                let failure = BatchFailure { error: e.to_string() };
                return self.bus.publish_event(&Event::CreateNextBatchFailure(failure)).await;
            }
        };

        info!(
            batch_id = ?batch.batch_id,
            directory = %batch.directory_reference,
            claims = batch.identifiers.len(),
            "Create next batch success"
        );

        let batch_id = batch.batch_id;
        if let Err(e) = self.bus.publish_event(&Event::CreateNextBatchSuccess(batch.into())).await {
            // Nobody will confirm a batch that was never announced.
            if let Some(batch_id) = batch_id {
                if let Err(ledger_err) = self.store.abandon_batch(batch_id).await {
                    error!(batch_id, error = %ledger_err, "failed to mark unannounced batch abandoned");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Build the next batch from every pending claim
    ///
    /// An empty pending set is not an error: it yields a batch with no
    /// identifiers and the directory service's empty-directory reference.
    ///
    /// # Returns
    /// * `Ok(Batch)` with the identifiers in claim order and the directory reference
    /// * `Err` if the store or the directory service failed
    pub async fn create_next_batch(&self) -> Result<Batch> {
        // Step 1: Snapshot the pending claims
        let identifiers: Vec<String> = self
            .store
            .query_pending()
            .await?
            .into_iter()
            .map(|claim| claim.identifier)
            .collect();

        // Step 2: Materialize the directory
        let empty_directory = self.directory.create_empty_directory().await?;
        let directory_reference = self.directory.add_files(&empty_directory, &identifiers).await?;

        // Step 3: Keep an audit record of non-empty batches
        let batch_id = if identifiers.is_empty() {
            None
        } else {
            let record = self.store.record_batch(&identifiers, &directory_reference).await?;
            Some(record.id)
        };

        Ok(Batch {
            batch_id,
            identifiers,
            directory_reference,
        })
    }
}
