//! Roster fixture builders.

use party_protocol::wire::{ParticipantEntry, RosterSnapshotMsg};

/// Build a participant entry with id-derived display name.
#[must_use]
pub fn participant(id: &str, joined_at: i64) -> ParticipantEntry {
    ParticipantEntry {
        id: id.to_string(),
        joined_at,
        display_name: id.to_string(),
        avatar_ref: None,
    }
}

/// Build a roster snapshot from `(id, joined_at)` pairs.
#[must_use]
pub fn roster(entries: &[(&str, i64)]) -> RosterSnapshotMsg {
    RosterSnapshotMsg {
        participants: entries
            .iter()
            .map(|(id, joined_at)| participant(id, *joined_at))
            .collect(),
    }
}

/// A fresh random participant id, for tests that need uniqueness.
#[must_use]
pub fn random_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
