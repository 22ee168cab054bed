//! Engine error types.
//!
//! Normal desynchronization is never an error: missed messages self-heal
//! through idempotent re-application and roster-driven re-broadcast. The
//! only condition surfaced loudly to the caller is a player adapter that
//! fails to initialize.

use thiserror::Error;

/// Playback coordination engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Publishing to the relay channel failed (transient; not retried).
    #[error("Relay publish failed: {0}")]
    RelayPublish(String),

    /// The player adapter failed to initialize or load the stream.
    #[error("Playback failed to start: {0}")]
    PlaybackFailed(String),

    /// Internal error (actor mailbox closed, response dropped).
    #[error("Internal error: {0}")]
    Internal(String),
}
