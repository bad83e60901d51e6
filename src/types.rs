use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One claimed content-address identifier.
///
/// Only `completed_at` ever changes after creation, and only once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEntry {
    pub identifier: String,
    pub claimed_at: DateTime<Utc>,
    /// `None` while the claim is eligible for batching or in flight.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ClaimEntry {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            claimed_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Lifecycle of a persisted batch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Built and waiting for the anchoring confirmation.
    Open,
    /// Confirmation received; member claims are complete.
    Confirmed,
    /// Never announced, so no confirmation is expected.
    Abandoned,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Open => "open",
            BatchStatus::Confirmed => "confirmed",
            BatchStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(BatchStatus::Open),
            "confirmed" => Some(BatchStatus::Confirmed),
            "abandoned" => Some(BatchStatus::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of a built, non-empty batch
///
/// Written after the directory artifact exists. Claims never point at it, so
/// it has no effect on which claims the next build selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub id: i64,
    /// Member identifiers, in claim order.
    pub identifiers: Vec<String>,
    pub directory_reference: String,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Built batch ready to be handed to the anchoring process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Ledger id; `None` for an empty batch, which is not recorded.
    pub batch_id: Option<i64>,
    pub identifiers: Vec<String>,
    pub directory_reference: String,
}

/// What confirming a directory reference did to the batch ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// At least one record moved to `Confirmed`.
    Confirmed,
    /// Every record for the reference was already `Confirmed`.
    AlreadyConfirmed,
    /// No record carries the reference.
    Untracked,
}

/// Payload of `claim-identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimIdentifier {
    pub identifier: String,
}

/// Payload shared by batch success, anchoring confirmation and completion events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPayload {
    pub identifiers: Vec<String>,
    pub directory_reference: String,
}

impl From<Batch> for BatchPayload {
    fn from(batch: Batch) -> Self {
        Self {
            identifiers: batch.identifiers,
            directory_reference: batch.directory_reference,
        }
    }
}

/// Payload of `create-next-batch.failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub error: String,
}

/// Payload of `complete-hashes.failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteHashesFailure {
    pub error: String,
    pub identifiers: Vec<String>,
    pub directory_reference: String,
}

impl CompleteHashesFailure {
    pub fn new(error: impl Into<String>, payload: BatchPayload) -> Self {
        Self {
            error: error.into(),
            identifiers: payload.identifiers,
            directory_reference: payload.directory_reference,
        }
    }
}
