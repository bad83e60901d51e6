//! Test doubles shared by the handler, saga and router tests.

use crate::bus::{Channel, EventBus, InMemoryBus, Subscription};
use crate::directory::DirectoryService;
use crate::error::{BatchWriterError, Result};
use crate::store::{ClaimStore, MemoryClaimStore};
use crate::types::{BatchRecord, ClaimEntry, Confirmation};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Directory service whose references spell out their contents.
#[derive(Default)]
pub struct FakeDirectory {
    pub fail: AtomicBool,
    pub add_calls: AtomicUsize,
    fixed_reference: Option<String>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-empty directory gets this reference.
    pub fn with_reference(reference: &str) -> Self {
        Self {
            fixed_reference: Some(reference.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn create_empty_directory(&self) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BatchWriterError::directory("ipfs unreachable"));
        }
        Ok("QmEmptyDir".to_string())
    }

    async fn add_files(&self, directory_reference: &str, identifiers: &[String]) -> Result<String> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BatchWriterError::directory("ipfs unreachable"));
        }
        if identifiers.is_empty() {
            return Ok(directory_reference.to_string());
        }
        Ok(self
            .fixed_reference
            .clone()
            .unwrap_or_else(|| format!("QmDir[{}]", identifiers.join(","))))
    }
}

/// Memory store with switchable failures per operation.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryClaimStore,
    pub fail_insert: AtomicBool,
    pub fail_query: AtomicBool,
    pub fail_complete: AtomicBool,
    pub fail_batches: AtomicBool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(BatchWriterError::store("database is unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for FaultyStore {
    async fn insert(&self, identifier: &str) -> Result<ClaimEntry> {
        Self::check(&self.fail_insert)?;
        self.inner.insert(identifier).await
    }

    async fn query_pending(&self) -> Result<Vec<ClaimEntry>> {
        Self::check(&self.fail_query)?;
        self.inner.query_pending().await
    }

    async fn mark_complete(&self, identifiers: &[String]) -> Result<u64> {
        Self::check(&self.fail_complete)?;
        self.inner.mark_complete(identifiers).await
    }

    async fn record_batch(&self, identifiers: &[String], directory_reference: &str) -> Result<BatchRecord> {
        Self::check(&self.fail_batches)?;
        self.inner.record_batch(identifiers, directory_reference).await
    }

    async fn abandon_batch(&self, batch_id: i64) -> Result<()> {
        Self::check(&self.fail_batches)?;
        self.inner.abandon_batch(batch_id).await
    }

    async fn confirm_batch(&self, directory_reference: &str) -> Result<Confirmation> {
        Self::check(&self.fail_batches)?;
        self.inner.confirm_batch(directory_reference).await
    }

    async fn claims_for(&self, identifier: &str) -> Result<Vec<ClaimEntry>> {
        self.inner.claims_for(identifier).await
    }

    async fn batch(&self, batch_id: i64) -> Result<Option<BatchRecord>> {
        self.inner.batch(batch_id).await
    }
}

/// In-memory bus that can refuse publishes on one channel.
#[derive(Default)]
pub struct FaultyBus {
    pub inner: InMemoryBus,
    refuse: std::sync::Mutex<Option<Channel>>,
}

impl FaultyBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, channel: Channel) {
        *self.refuse.lock().unwrap() = Some(channel);
    }
}

#[async_trait]
impl EventBus for FaultyBus {
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> Result<()> {
        let refused = *self.refuse.lock().unwrap();
        if refused == Some(channel) {
            return Err(BatchWriterError::bus(format!("{channel} is unavailable")));
        }
        self.inner.publish(channel, payload).await
    }

    async fn subscribe(&self, channel: Channel) -> Result<Subscription> {
        self.inner.subscribe(channel).await
    }
}
