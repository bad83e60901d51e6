//! Typed event schemas
//!
//! Each channel carries exactly one payload shape. Inbound bytes are decoded
//! against the schema of the channel they arrived on; anything that does not
//! fit is rejected as [`BatchWriterError::MalformedPayload`] instead of being
//! half-parsed inside a handler.

use serde::de::DeserializeOwned;

use super::Channel;
use crate::error::{BatchWriterError, Result};
use crate::types::{BatchFailure, BatchPayload, ClaimIdentifier, CompleteHashesFailure};

/// An event on one of the batch writer's channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClaimIdentifier(ClaimIdentifier),
    CreateNextBatchRequest,
    CreateNextBatchSuccess(BatchPayload),
    CreateNextBatchFailure(BatchFailure),
    AnchoringConfirmation(BatchPayload),
    CompleteHashesRequest(BatchPayload),
    CompleteHashesSuccess(BatchPayload),
    CompleteHashesFailure(CompleteHashesFailure),
}

impl Event {
    pub fn channel(&self) -> Channel {
        match self {
            Event::ClaimIdentifier(_) => Channel::ClaimIdentifier,
            Event::CreateNextBatchRequest => Channel::CreateNextBatchRequest,
            Event::CreateNextBatchSuccess(_) => Channel::CreateNextBatchSuccess,
            Event::CreateNextBatchFailure(_) => Channel::CreateNextBatchFailure,
            Event::AnchoringConfirmation(_) => Channel::AnchoringConfirmation,
            Event::CompleteHashesRequest(_) => Channel::CompleteHashesRequest,
            Event::CompleteHashesSuccess(_) => Channel::CompleteHashesSuccess,
            Event::CompleteHashesFailure(_) => Channel::CompleteHashesFailure,
        }
    }

    /// Serialize the payload to its JSON wire form.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoded = match self {
            Event::ClaimIdentifier(payload) => serde_json::to_vec(payload),
            Event::CreateNextBatchRequest => Ok(b"{}".to_vec()),
            Event::CreateNextBatchSuccess(payload)
            | Event::AnchoringConfirmation(payload)
            | Event::CompleteHashesRequest(payload)
            | Event::CompleteHashesSuccess(payload) => serde_json::to_vec(payload),
            Event::CreateNextBatchFailure(payload) => serde_json::to_vec(payload),
            Event::CompleteHashesFailure(payload) => serde_json::to_vec(payload),
        };
        encoded.map_err(|e| BatchWriterError::bus(format!("failed to encode {}: {e}", self.channel())))
    }

    /// Decode and validate a payload received on `channel`.
    pub fn decode(channel: Channel, payload: &[u8]) -> Result<Self> {
        let event = match channel {
            Channel::ClaimIdentifier => {
                let claim: ClaimIdentifier = parse(channel, payload)?;
                if claim.identifier.trim().is_empty() {
                    return Err(BatchWriterError::malformed(channel.name(), "identifier is empty"));
                }
                Event::ClaimIdentifier(claim)
            }
            Channel::CreateNextBatchRequest => {
                check_empty_request(channel, payload)?;
                Event::CreateNextBatchRequest
            }
            Channel::CreateNextBatchSuccess => Event::CreateNextBatchSuccess(parse_batch(channel, payload)?),
            Channel::CreateNextBatchFailure => Event::CreateNextBatchFailure(parse(channel, payload)?),
            Channel::AnchoringConfirmation => Event::AnchoringConfirmation(parse_batch(channel, payload)?),
            Channel::CompleteHashesRequest => Event::CompleteHashesRequest(parse_batch(channel, payload)?),
            Channel::CompleteHashesSuccess => Event::CompleteHashesSuccess(parse_batch(channel, payload)?),
            Channel::CompleteHashesFailure => Event::CompleteHashesFailure(parse(channel, payload)?),
        };
        Ok(event)
    }
}

fn parse<T: DeserializeOwned>(channel: Channel, payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| BatchWriterError::malformed(channel.name(), e.to_string()))
}

fn parse_batch(channel: Channel, payload: &[u8]) -> Result<BatchPayload> {
    let batch: BatchPayload = parse(channel, payload)?;
    if batch.directory_reference.trim().is_empty() {
        return Err(BatchWriterError::malformed(channel.name(), "directoryReference is empty"));
    }
    Ok(batch)
}

/// Build requests carry no data. An empty body, `""` or any JSON object is
/// accepted; the object's fields are ignored.
fn check_empty_request(channel: Channel, payload: &[u8]) -> Result<()> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(serde_json::Value::String(s)) if s.is_empty() => Ok(()),
        Ok(other) => Err(BatchWriterError::malformed(
            channel.name(),
            format!("expected an empty request, got {other}"),
        )),
        Err(e) => Err(BatchWriterError::malformed(channel.name(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_payload_uses_contract_field_names() {
        let event = Event::CreateNextBatchSuccess(BatchPayload {
            identifiers: vec!["Qm111".to_string()],
            directory_reference: "Qm999".to_string(),
        });
        let value: serde_json::Value = serde_json::from_slice(&event.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "identifiers": ["Qm111"], "directoryReference": "Qm999" })
        );
    }

    #[test]
    fn test_decode_confirmation() {
        let payload = br#"{"identifiers":["Qm1","Qm2"],"directoryReference":"QmDir"}"#;
        let event = Event::decode(Channel::AnchoringConfirmation, payload).unwrap();
        match event {
            Event::AnchoringConfirmation(batch) => {
                assert_eq!(batch.identifiers, vec!["Qm1", "Qm2"]);
                assert_eq!(batch.directory_reference, "QmDir");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_empty_identifier_is_malformed() {
        let err = Event::decode(Channel::ClaimIdentifier, br#"{"identifier":"  "}"#).unwrap_err();
        assert!(matches!(err, BatchWriterError::MalformedPayload { .. }));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = Event::decode(Channel::AnchoringConfirmation, br#"{"identifiers":[]}"#).unwrap_err();
        match err {
            BatchWriterError::MalformedPayload { channel, .. } => assert_eq!(channel, "anchoring.confirmation"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_build_request_accepts_empty_forms() {
        let bodies: [&[u8]; 5] = [b"", b"{}", b"\"\"", b"  ", br#"{"a":1}"#];
        for body in bodies {
            assert_eq!(
                Event::decode(Channel::CreateNextBatchRequest, body).unwrap(),
                Event::CreateNextBatchRequest
            );
        }
        assert!(Event::decode(Channel::CreateNextBatchRequest, b"[1]").is_err());
    }

    #[test]
    fn test_complete_hashes_failure_carries_error_and_batch() {
        let failure = CompleteHashesFailure::new(
            "store down",
            BatchPayload {
                identifiers: vec!["Qm1".to_string()],
                directory_reference: "QmDir".to_string(),
            },
        );
        let bytes = Event::CompleteHashesFailure(failure.clone()).encode().unwrap();
        assert_eq!(
            Event::decode(Channel::CompleteHashesFailure, &bytes).unwrap(),
            Event::CompleteHashesFailure(failure)
        );
    }
}
