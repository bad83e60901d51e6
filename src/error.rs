//! Error types for the batch writer.
//!
//! Every collaborator failure is mapped onto one of these kinds so handlers can
//! log it and, where a terminal event exists, carry its text in a failure event.

use thiserror::Error;

/// Result type alias for batch writer operations.
pub type Result<T> = std::result::Result<T, BatchWriterError>;

/// Errors that can occur while accumulating, batching or completing claims.
#[derive(Debug, Error)]
pub enum BatchWriterError {
    /// The claim store rejected or failed an operation.
    #[error("store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    /// The directory service failed to build a directory artifact.
    #[error("directory service error: {message}")]
    Directory {
        /// Description of the directory service failure.
        message: String,
    },

    /// The event transport failed to publish or subscribe.
    #[error("event bus error: {message}")]
    Bus {
        /// Description of the transport failure.
        message: String,
    },

    /// An inbound payload did not match its channel's schema.
    #[error("malformed payload on {channel}: {message}")]
    MalformedPayload {
        /// Channel the payload arrived on.
        channel: String,
        /// What was wrong with it.
        message: String,
    },
}

impl BatchWriterError {
    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Creates a directory service error.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
        }
    }

    /// Creates an event bus error.
    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    /// Creates a malformed payload error for the given channel.
    pub fn malformed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPayload {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for BatchWriterError {
    fn from(err: sqlx::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<reqwest::Error> for BatchWriterError {
    fn from(err: reqwest::Error) -> Self {
        Self::directory(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_payload_names_the_channel() {
        let err = BatchWriterError::malformed("claim-identifier", "identifier is empty");
        assert_eq!(
            err.to_string(),
            "malformed payload on claim-identifier: identifier is empty"
        );
    }
}
