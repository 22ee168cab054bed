//! Message types for the session actor.
//!
//! Every stimulus the engine reacts to — roster snapshots, raw relay
//! deliveries, player adapter events, resync requests — is one variant
//! of [`SessionMessage`], dispatched through a single handler so the
//! ordering and echo-suppression invariants are auditable in one place.
//! Request-reply uses `tokio::sync::oneshot`.

use crate::adapter::{AdapterEvent, PlaybackSnapshot};
use crate::errors::EngineError;
use crate::relay::AdapterPhase;
use bytes::Bytes;
use party_protocol::wire::RosterSnapshotMsg;
use serde::Serialize;
use tokio::sync::oneshot;

/// Messages sent to a `SessionActor`.
#[derive(Debug)]
pub enum SessionMessage {
    /// A full roster snapshot arrived from the relay.
    RosterUpdate {
        snapshot: RosterSnapshotMsg,
    },

    /// A raw payload arrived on the command channel. May be malformed,
    /// may be the local participant's own echo.
    Inbound {
        payload: Bytes,
    },

    /// The local player adapter emitted a transport event.
    Adapter {
        event: AdapterEvent,
    },

    /// A client asked for an immediate state re-broadcast (late-join
    /// catch-up). No-op unless the local participant is the host.
    RequestResync {
        /// Response channel: whether a re-broadcast was published.
        respond_to: oneshot::Sender<bool>,
    },

    /// Get a snapshot of the session for UI rendering or debugging.
    GetView {
        /// Response channel for the session view.
        respond_to: oneshot::Sender<SessionView>,
    },
}

/// One participant as presented to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    /// Participant ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Join timestamp, epoch milliseconds.
    pub joined_at: i64,
    /// Whether this participant is the elected host.
    pub is_host: bool,
    /// Whether this is the local participant.
    pub is_local: bool,
}

/// Snapshot of a session for introspection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session ID.
    pub session_id: String,
    /// Local participant ID.
    pub local_id: String,
    /// Elected host, if determined.
    pub host_id: Option<String>,
    /// Whether the local participant is the host.
    pub is_local_host: bool,
    /// Current members, ordered by join time.
    pub participants: Vec<ParticipantView>,
    /// Local player load state.
    pub phase: AdapterPhase,
    /// Commands held until the player is ready.
    pub pending_commands: usize,
    /// Local playback state.
    pub playback: PlaybackSnapshot,
    /// Set when the player failed to initialize.
    pub failure: Option<String>,
}

impl SessionView {
    /// Playback health at the time of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlaybackFailed`] once the local player has
    /// failed to initialize, carrying the adapter's reason. Ordinary
    /// desynchronization never surfaces here.
    pub fn playback_result(&self) -> Result<(), EngineError> {
        match &self.failure {
            Some(reason) => Err(EngineError::PlaybackFailed(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_view_equality() {
        let view = ParticipantView {
            id: "a".to_string(),
            display_name: "Alice".to_string(),
            joined_at: 0,
            is_host: true,
            is_local: false,
        };
        assert_eq!(view, view.clone());
    }

    #[test]
    fn test_session_view_defaults_sensible() {
        let view = SessionView {
            session_id: "s".to_string(),
            local_id: "a".to_string(),
            host_id: None,
            is_local_host: false,
            participants: Vec::new(),
            phase: AdapterPhase::Loading,
            pending_commands: 0,
            playback: PlaybackSnapshot::default(),
            failure: None,
        };
        assert!(!view.is_local_host);
        assert!(view.playback.position.abs() < f64::EPSILON);
        assert!(!view.playback.is_playing);
        assert!(view.playback_result().is_ok());
    }

    #[test]
    fn test_player_failure_becomes_playback_error() {
        let view = SessionView {
            session_id: "s".to_string(),
            local_id: "a".to_string(),
            host_id: None,
            is_local_host: false,
            participants: Vec::new(),
            phase: AdapterPhase::Loading,
            pending_commands: 0,
            playback: PlaybackSnapshot::default(),
            failure: Some("stream 404".to_string()),
        };
        let err = view.playback_result().unwrap_err();
        assert!(matches!(err, EngineError::PlaybackFailed(ref reason) if reason == "stream 404"));
    }
}
