//! Batch writer: accumulates claimed content identifiers, groups them into
//! directory artifacts on a schedule and marks them complete once the
//! anchoring process confirms the batch.
//!
//! Components talk to each other only through named channels on an event bus.

pub mod api; // HTTP ingress for inbound events.
pub mod app; // Composition root.
pub mod batch; // Batch building and the request scheduler.
pub mod bus; // Channels, typed events and transports.
pub mod config; // Defines and loads system configuration.
pub mod directory; // Directory artifact service (IPFS).
pub mod error;
pub mod intake; // Claim intake.
pub mod router; // Channel to handler dispatch.
pub mod saga; // Completion saga.
pub mod store; // Claim and batch persistence.
pub mod types; // Defines common data structures and payloads.

#[cfg(test)]
mod testing;

// Re-export commonly used types and configurations for easier access.
pub use app::App;
pub use config::Config;
pub use error::{BatchWriterError, Result};
pub use types::*;
