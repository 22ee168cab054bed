//! Host election.
//!
//! The host is the participant with the earliest join time, ties broken
//! by id ordering. Because election is a pure function of the roster
//! snapshot — and the relay broadcasts the same snapshot to everyone —
//! all participants converge on the same host without exchanging any
//! election messages.

use crate::roster::{Participant, Roster};
use tracing::debug;

/// Select the host from a roster snapshot.
///
/// Returns `None` only for an empty member list.
#[must_use]
pub fn elect_host(members: &[Participant]) -> Option<&Participant> {
    members.iter().min_by(|a, b| {
        a.joined_at
            .cmp(&b.joined_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// The derived single-authority state.
///
/// Recomputed from the roster on every change, never incrementally
/// patched — recomputation is the only correctness-preserving update
/// path, and it recovers automatically from missed join/leave events
/// once the next full snapshot arrives.
#[derive(Debug, Default)]
pub struct HostState {
    host_id: Option<String>,
}

impl HostState {
    /// Host state before the first roster snapshot: undetermined. All
    /// command publication is suppressed while undetermined.
    #[must_use]
    pub fn undetermined() -> Self {
        Self::default()
    }

    /// Recompute the host from the current roster.
    pub fn recompute(&mut self, roster: &Roster) -> Option<&str> {
        let new_host = elect_host(roster.current()).map(|p| p.id.clone());
        if new_host != self.host_id {
            debug!(
                target: "party.election",
                old = ?self.host_id,
                new = ?new_host,
                "Host changed"
            );
        }
        self.host_id = new_host;
        self.host_id.as_deref()
    }

    /// The currently elected host id, if determined.
    #[must_use]
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Whether any host has been elected yet.
    #[must_use]
    pub fn is_determined(&self) -> bool {
        self.host_id.is_some()
    }

    /// Whether the local participant is the elected host.
    #[must_use]
    pub fn is_local_host(&self, local_id: &str) -> bool {
        self.host_id.as_deref() == Some(local_id)
    }
}
