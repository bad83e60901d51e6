//! Claim Store Module
//!
//! This module provides the durable record of claimed identifiers and of the
//! batches they were grouped into:
//! - `ClaimStore`: the storage seam used by intake, the batch builder and the saga
//! - `SqliteClaimStore`: sqlx-backed store for real deployments
//! - `MemoryClaimStore`: in-process store with the same semantics
//!
//! # Pending claims
//! A claim is pending while it has no `completed_at`. Selection is a plain
//! snapshot read: nothing is reserved, so two builds with no confirmation in
//! between select overlapping sets. Batch records are an audit ledger and
//! never change which claims are pending.

mod memory;
mod sqlite;


pub use memory::MemoryClaimStore;
pub use sqlite::SqliteClaimStore;

use crate::error::Result;
use crate::types::{BatchRecord, ClaimEntry, Confirmation};
use async_trait::async_trait;

/// Storage seam for claims and batch records.
///
/// Implementations must make each method atomic on its own; nothing here
/// spans more than one call.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Record a new claim with `claimed_at = now`. Duplicates are separate claims.
    async fn insert(&self, identifier: &str) -> Result<ClaimEntry>;

    /// Every claim without `completed_at`, in the order they were claimed.
    async fn query_pending(&self) -> Result<Vec<ClaimEntry>>;

    /// Set `completed_at = now` on every incomplete claim with one of these identifiers.
    ///
    /// Already complete claims keep their first timestamp. Returns how many
    /// claims changed.
    async fn mark_complete(&self, identifiers: &[String]) -> Result<u64>;

    /// Append an `Open` record for a built batch. Claims are not touched.
    async fn record_batch(&self, identifiers: &[String], directory_reference: &str) -> Result<BatchRecord>;

    /// Move an `Open` record to `Abandoned`. Other states are left alone.
    async fn abandon_batch(&self, batch_id: i64) -> Result<()>;

    /// Move every record for `directory_reference` to `Confirmed`.
    async fn confirm_batch(&self, directory_reference: &str) -> Result<Confirmation>;

    /// Every claim recorded for an identifier, oldest first.
    async fn claims_for(&self, identifier: &str) -> Result<Vec<ClaimEntry>>;

    /// Look up a batch record by id.
    async fn batch(&self, batch_id: i64) -> Result<Option<BatchRecord>>;
}
