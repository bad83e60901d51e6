//! In-memory claim store.
//!
//! Holds claims in insertion order behind a single `RwLock`, which makes each
//! operation atomic the same way a SQLite statement is.

use super::ClaimStore;
use crate::error::Result;
use crate::types::{BatchRecord, BatchStatus, ClaimEntry, Confirmation};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    claims: Vec<ClaimEntry>,
    batches: Vec<BatchRecord>,
}

/// Claim store kept entirely in process memory
#[derive(Default)]
pub struct MemoryClaimStore {
    state: RwLock<MemoryState>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn insert(&self, identifier: &str) -> Result<ClaimEntry> {
        let entry = ClaimEntry::new(identifier);
        let mut state = self.state.write().await;
        state.claims.push(entry.clone());
        Ok(entry)
    }

    async fn query_pending(&self) -> Result<Vec<ClaimEntry>> {
        let state = self.state.read().await;
        Ok(state
            .claims
            .iter()
            .filter(|claim| claim.completed_at.is_none())
            .cloned()
            .collect())
    }

    async fn mark_complete(&self, identifiers: &[String]) -> Result<u64> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut changed = 0;
        for claim in state
            .claims
            .iter_mut()
            .filter(|claim| claim.completed_at.is_none() && identifiers.contains(&claim.identifier))
        {
            claim.completed_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn record_batch(&self, identifiers: &[String], directory_reference: &str) -> Result<BatchRecord> {
        let mut state = self.state.write().await;
        let record = BatchRecord {
            id: state.batches.len() as i64 + 1,
            identifiers: identifiers.to_vec(),
            directory_reference: directory_reference.to_string(),
            status: BatchStatus::Open,
            created_at: Utc::now(),
            confirmed_at: None,
        };
        state.batches.push(record.clone());
        Ok(record)
    }

    async fn abandon_batch(&self, batch_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(batch) = state
            .batches
            .iter_mut()
            .find(|batch| batch.id == batch_id && batch.status == BatchStatus::Open)
        {
            batch.status = BatchStatus::Abandoned;
        }
        Ok(())
    }

    async fn confirm_batch(&self, directory_reference: &str) -> Result<Confirmation> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut confirmed = 0;
        let mut already_confirmed = 0;
        for batch in state
            .batches
            .iter_mut()
            .filter(|batch| batch.directory_reference == directory_reference)
        {
            if batch.status == BatchStatus::Confirmed {
                already_confirmed += 1;
            } else {
                batch.status = BatchStatus::Confirmed;
                batch.confirmed_at = Some(now);
                confirmed += 1;
            }
        }

        Ok(match (confirmed, already_confirmed) {
            (0, 0) => Confirmation::Untracked,
            (0, _) => Confirmation::AlreadyConfirmed,
            _ => Confirmation::Confirmed,
        })
    }

    async fn claims_for(&self, identifier: &str) -> Result<Vec<ClaimEntry>> {
        let state = self.state.read().await;
        Ok(state
            .claims
            .iter()
            .filter(|claim| claim.identifier == identifier)
            .cloned()
            .collect())
    }

    async fn batch(&self, batch_id: i64) -> Result<Option<BatchRecord>> {
        let state = self.state.read().await;
        Ok(state.batches.iter().find(|batch| batch.id == batch_id).cloned())
    }
}
