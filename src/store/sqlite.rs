//! SQLite Claim Store Module
//!
//! This module implements the claim store on top of an `sqlx` SQLite pool.
//! Queries are built at runtime (`sqlx::query`, not `sqlx::query!`) so the
//! crate compiles without a database.
//!
//! # Storage
//! - `claims`: one row per claim; `completed_at` is the only mutable column
//! - `batches`: one row per built non-empty batch, with its member identifiers as a JSON array
//!
//! Timestamps are stored as unix milliseconds so they compare as integers.

use super::ClaimStore;
use crate::error::{BatchWriterError, Result};
use crate::types::{BatchRecord, BatchStatus, ClaimEntry, Confirmation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS claims (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identifier TEXT NOT NULL,
        claimed_at INTEGER NOT NULL,
        completed_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS claims_identifier ON claims(identifier)",
    "CREATE TABLE IF NOT EXISTS batches (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        identifiers TEXT NOT NULL,
        directory_reference TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        confirmed_at INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS batches_directory_reference ON batches(directory_reference)",
];

#[derive(FromRow)]
struct ClaimRow {
    identifier: String,
    claimed_at: i64,
    completed_at: Option<i64>,
}

impl TryFrom<ClaimRow> for ClaimEntry {
    type Error = BatchWriterError;

    fn try_from(row: ClaimRow) -> Result<Self> {
        Ok(ClaimEntry {
            identifier: row.identifier,
            claimed_at: from_millis(row.claimed_at)?,
            completed_at: row.completed_at.map(from_millis).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct BatchRow {
    id: i64,
    identifiers: String,
    directory_reference: String,
    status: String,
    created_at: i64,
    confirmed_at: Option<i64>,
}

impl TryFrom<BatchRow> for BatchRecord {
    type Error = BatchWriterError;

    fn try_from(row: BatchRow) -> Result<Self> {
        let identifiers = serde_json::from_str(&row.identifiers)
            .map_err(|e| BatchWriterError::store(format!("batch {} has corrupt identifiers: {e}", row.id)))?;
        let status = BatchStatus::parse(&row.status)
            .ok_or_else(|| BatchWriterError::store(format!("batch {} has unknown status {}", row.id, row.status)))?;

        Ok(BatchRecord {
            id: row.id,
            identifiers,
            directory_reference: row.directory_reference,
            status,
            created_at: from_millis(row.created_at)?,
            confirmed_at: row.confirmed_at.map(from_millis).transpose()?,
        })
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| BatchWriterError::store(format!("timestamp out of range: {millis}")))
}

/// Claim store persisted in SQLite
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct SqliteClaimStore {
    pool: SqlitePool,
}

impl SqliteClaimStore {
    /// Connect to the database and create the schema if needed
    ///
    /// # Arguments
    /// * `url` - Connection URL, e.g. "sqlite://batch-writer.db" or "sqlite::memory:"
    ///
    /// # Returns
    /// A ready store, or a `Store` error if the database can't be opened
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to ":memory:" is a separate database, so keep exactly one alive.
        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;

        info!(url = %url, "claim store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for SqliteClaimStore {
    async fn insert(&self, identifier: &str) -> Result<ClaimEntry> {
        let mut entry = ClaimEntry::new(identifier);
        // Match the precision the row will be read back with.
        entry.claimed_at = from_millis(entry.claimed_at.timestamp_millis())?;
        sqlx::query("INSERT INTO claims (identifier, claimed_at) VALUES (?, ?)")
            .bind(&entry.identifier)
            .bind(entry.claimed_at.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(entry)
    }

    async fn query_pending(&self) -> Result<Vec<ClaimEntry>> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            "SELECT identifier, claimed_at, completed_at FROM claims WHERE completed_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ClaimEntry::try_from).collect()
    }

    async fn mark_complete(&self, identifiers: &[String]) -> Result<u64> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;
        for identifier in identifiers {
            let result = sqlx::query(
                "UPDATE claims SET completed_at = ? WHERE identifier = ? AND completed_at IS NULL",
            )
            .bind(now)
            .bind(identifier)
            .execute(&mut *tx)
            .await?;
            changed += result.rows_affected();
        }
        tx.commit().await?;
        Ok(changed)
    }

    async fn record_batch(&self, identifiers: &[String], directory_reference: &str) -> Result<BatchRecord> {
        let created_at = from_millis(Utc::now().timestamp_millis())?;
        let encoded = serde_json::to_string(identifiers)
            .map_err(|e| BatchWriterError::store(format!("failed to encode batch identifiers: {e}")))?;

        let id = sqlx::query(
            "INSERT INTO batches (identifiers, directory_reference, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(encoded)
        .bind(directory_reference)
        .bind(BatchStatus::Open.as_str())
        .bind(created_at.timestamp_millis())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        debug!(batch_id = id, claims = identifiers.len(), "recorded batch");

        Ok(BatchRecord {
            id,
            identifiers: identifiers.to_vec(),
            directory_reference: directory_reference.to_string(),
            status: BatchStatus::Open,
            created_at,
            confirmed_at: None,
        })
    }

    async fn abandon_batch(&self, batch_id: i64) -> Result<()> {
        sqlx::query("UPDATE batches SET status = ? WHERE id = ? AND status = ?")
            .bind(BatchStatus::Abandoned.as_str())
            .bind(batch_id)
            .bind(BatchStatus::Open.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn confirm_batch(&self, directory_reference: &str) -> Result<Confirmation> {
        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.begin().await?;

        let confirmed = sqlx::query(
            "UPDATE batches SET status = ?, confirmed_at = ? WHERE directory_reference = ? AND status != ?",
        )
        .bind(BatchStatus::Confirmed.as_str())
        .bind(now)
        .bind(directory_reference)
        .bind(BatchStatus::Confirmed.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let tracked = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM batches WHERE directory_reference = ?")
            .bind(directory_reference)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(match (confirmed, tracked) {
            (_, 0) => Confirmation::Untracked,
            (0, _) => Confirmation::AlreadyConfirmed,
            _ => Confirmation::Confirmed,
        })
    }

    async fn claims_for(&self, identifier: &str) -> Result<Vec<ClaimEntry>> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            "SELECT identifier, claimed_at, completed_at FROM claims WHERE identifier = ? ORDER BY id",
        )
        .bind(identifier)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ClaimEntry::try_from).collect()
    }

    async fn batch(&self, batch_id: i64) -> Result<Option<BatchRecord>> {
        let row = sqlx::query_as::<_, BatchRow>(
            "SELECT id, identifiers, directory_reference, status, created_at, confirmed_at FROM batches WHERE id = ?",
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(BatchRecord::try_from).transpose()
    }
}
