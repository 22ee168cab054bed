//! Encoding and decoding of wire messages.
//!
//! Decode failures are a discard signal for the dispatch loop, never a
//! fatal condition: an unknown `type` tag or a missing required field
//! means the message is dropped and the loop keeps running.

use crate::wire::{RosterSnapshotMsg, WireCommand};
use bytes::Bytes;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Message could not be parsed: unknown tag, missing field, or
    /// syntactically invalid JSON.
    #[error("Malformed message: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Encode a transport command to wire bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_command(command: &WireCommand) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(serde_json::to_vec(command)?))
}

/// Decode a transport command from wire bytes.
///
/// # Errors
///
/// Returns an error if the payload is not a well-formed command.
pub fn decode_command(data: &[u8]) -> Result<WireCommand, CodecError> {
    Ok(serde_json::from_slice(data)?)
}

/// Encode a roster snapshot to wire bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_roster(snapshot: &RosterSnapshotMsg) -> Result<Bytes, CodecError> {
    Ok(Bytes::from(serde_json::to_vec(snapshot)?))
}

/// Decode a roster snapshot from wire bytes.
///
/// # Errors
///
/// Returns an error if the payload is not a well-formed snapshot.
pub fn decode_roster(data: &[u8]) -> Result<RosterSnapshotMsg, CodecError> {
    Ok(serde_json::from_slice(data)?)
}
