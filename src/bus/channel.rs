//! Named event channels and their direction relative to this service.

use serde::{Deserialize, Serialize};

/// Which side of the service a channel faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Produced by external collaborators, consumed here.
    Inbound,
    /// Produced and consumed here.
    Internal,
    /// Produced here for downstream consumers.
    Outbound,
}

/// Every channel the batch writer publishes to or consumes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    ClaimIdentifier,
    CreateNextBatchRequest,
    CreateNextBatchSuccess,
    CreateNextBatchFailure,
    AnchoringConfirmation,
    CompleteHashesRequest,
    CompleteHashesSuccess,
    CompleteHashesFailure,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::ClaimIdentifier,
        Channel::CreateNextBatchRequest,
        Channel::CreateNextBatchSuccess,
        Channel::CreateNextBatchFailure,
        Channel::AnchoringConfirmation,
        Channel::CompleteHashesRequest,
        Channel::CompleteHashesSuccess,
        Channel::CompleteHashesFailure,
    ];

    /// Wire name of the channel.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::ClaimIdentifier => "claim-identifier",
            Channel::CreateNextBatchRequest => "create-next-batch.request",
            Channel::CreateNextBatchSuccess => "create-next-batch.success",
            Channel::CreateNextBatchFailure => "create-next-batch.failure",
            Channel::AnchoringConfirmation => "anchoring.confirmation",
            Channel::CompleteHashesRequest => "complete-hashes.request",
            Channel::CompleteHashesSuccess => "complete-hashes.success",
            Channel::CompleteHashesFailure => "complete-hashes.failure",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Channel::ALL.into_iter().find(|channel| channel.name() == name)
    }

    pub fn direction(&self) -> Direction {
        match self {
            Channel::ClaimIdentifier | Channel::AnchoringConfirmation => Direction::Inbound,
            // The scheduler publishes this one, but an operator may also trigger a build.
            Channel::CreateNextBatchRequest => Direction::Inbound,
            Channel::CompleteHashesRequest => Direction::Internal,
            Channel::CreateNextBatchSuccess
            | Channel::CreateNextBatchFailure
            | Channel::CompleteHashesSuccess
            | Channel::CompleteHashesFailure => Direction::Outbound,
        }
    }

    /// Channels whose events leave the service.
    pub fn outbound() -> impl Iterator<Item = Channel> {
        Channel::ALL
            .into_iter()
            .filter(|channel| channel.direction() == Direction::Outbound)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
