//! Participant roster bookkeeping.
//!
//! The roster is replaced wholesale from full snapshots broadcast by
//! the relay, never patched from deltas. Recomputing everything from
//! the latest snapshot is what lets a participant recover from missed
//! individual join/leave events.

use party_protocol::wire::{ParticipantEntry, RosterSnapshotMsg};
use std::cmp::Ordering;

/// One session participant as seen by the local roster.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Opaque stable identifier, unique per session membership.
    pub id: String,
    /// Presentation-only display name.
    pub display_name: String,
    /// Presentation-only avatar reference.
    pub avatar_ref: Option<String>,
    /// Join timestamp, epoch milliseconds, recorded at first sighting.
    pub joined_at: i64,
}

impl Participant {
    fn from_entry(entry: ParticipantEntry) -> Self {
        Self {
            id: entry.id,
            display_name: entry.display_name,
            avatar_ref: entry.avatar_ref,
            joined_at: entry.joined_at,
        }
    }

    /// Total order used everywhere membership order matters: join time
    /// first, id as the deterministic tie-break.
    fn order(&self, other: &Self) -> Ordering {
        self.joined_at
            .cmp(&other.joined_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// The live set of session participants, ordered by join time.
///
/// Owned exclusively by the session actor; other components only read
/// snapshots of it.
#[derive(Debug, Default)]
pub struct Roster {
    members: Vec<Participant>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale from a full snapshot.
    ///
    /// An empty incoming list is accepted: the session may transiently
    /// have zero externally-visible members while the local join record
    /// propagates.
    pub fn update(&mut self, snapshot: RosterSnapshotMsg) -> &[Participant] {
        self.members = snapshot
            .participants
            .into_iter()
            .map(Participant::from_entry)
            .collect();
        self.members.sort_by(Participant::order);
        &self.members
    }

    /// Insert a member if absent, keeping order. Used to keep the local
    /// participant implicitly present in its own roster view.
    pub fn ensure_member(&mut self, participant: Participant) {
        if !self.contains(&participant.id) {
            self.members.push(participant);
            self.members.sort_by(Participant::order);
        }
    }

    /// The live ordered snapshot.
    #[must_use]
    pub fn current(&self) -> &[Participant] {
        &self.members
    }

    /// Whether the given id is a current member.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|p| p.id == id)
    }

    /// Look up a member by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.members.iter().find(|p| p.id == id)
    }

    /// Number of current members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
