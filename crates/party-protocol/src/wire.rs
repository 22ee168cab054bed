//! Wire message types.
//!
//! Commands are internally tagged JSON objects:
//!
//! ```json
//! { "type": "SEEK", "originId": "1957...", "time": 42.0 }
//! ```
//!
//! `originId` identifies the participant that issued the command and is
//! the sole basis for echo suppression — commands carry no sequence
//! numbers; ordering relies on relay delivery order.

use serde::{Deserialize, Serialize};

/// A transport command broadcast by the session host.
///
/// Commands are idempotent by construction: reapplying `Pause` when
/// already paused, or `Seek { time }` when already at `time`, must be
/// observable as "no state change", never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum WireCommand {
    /// Resume playback.
    Play {
        #[serde(rename = "originId")]
        origin_id: String,
    },
    /// Halt playback, keeping position.
    Pause {
        #[serde(rename = "originId")]
        origin_id: String,
    },
    /// Jump to an absolute position, in seconds.
    Seek {
        #[serde(rename = "originId")]
        origin_id: String,
        time: f64,
    },
    /// Change the playback rate multiplier.
    Rate {
        #[serde(rename = "originId")]
        origin_id: String,
        rate: f32,
    },
}

impl WireCommand {
    /// The id of the participant that issued this command.
    #[must_use]
    pub fn origin_id(&self) -> &str {
        match self {
            Self::Play { origin_id }
            | Self::Pause { origin_id }
            | Self::Seek { origin_id, .. }
            | Self::Rate { origin_id, .. } => origin_id,
        }
    }

    /// Wire tag of this command, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Play { .. } => "PLAY",
            Self::Pause { .. } => "PAUSE",
            Self::Seek { .. } => "SEEK",
            Self::Rate { .. } => "RATE",
        }
    }
}

/// One participant in a roster snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEntry {
    /// Opaque stable identifier, unique per session membership.
    pub id: String,
    /// Wall-clock join timestamp, epoch milliseconds.
    #[serde(rename = "joinedAt")]
    pub joined_at: i64,
    /// Presentation-only display name.
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Presentation-only avatar reference.
    #[serde(rename = "avatarRef", default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
}

/// Full-membership roster broadcast.
///
/// Always a complete snapshot, never a delta — consumers replace their
/// roster wholesale so a missed individual join/leave self-heals on the
/// next snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RosterSnapshotMsg {
    /// Current members, in no guaranteed order.
    pub participants: Vec<ParticipantEntry>,
}
