//! Late-join state reconciliation.
//!
//! The wire protocol has exactly one message kind (commands), so a
//! participant who joins mid-session cannot query the current state.
//! Instead the host re-issues its current `{PLAY|PAUSE}` and
//! `SEEK{position}` whenever the roster size changes, so every existing
//! and newly-joined participant converges within one broadcast cycle.
//! This is a host-side obligation, not a best-effort nicety.

use crate::adapter::PlaybackSnapshot;
use crate::relay::TransportIntent;

/// Rate deviation from 1.0 below which no `RATE` re-broadcast is sent.
const RATE_UNITY_TOLERANCE: f32 = 0.001;

/// Watches roster size and produces the host's re-broadcast set.
#[derive(Debug, Default)]
pub struct StateReconciler {
    last_size: Option<usize>,
}

impl StateReconciler {
    /// Create a reconciler that has seen no roster yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest roster size. Returns whether it changed since
    /// the previous observation (the first observation counts as a
    /// change).
    pub fn observe_roster(&mut self, size: usize) -> bool {
        let changed = self.last_size != Some(size);
        self.last_size = Some(size);
        changed
    }

    /// The command set the host broadcasts to reconcile everyone to its
    /// current state: play/pause, position, and — only when off-unity —
    /// the rate.
    #[must_use]
    pub fn resync_intents(snapshot: PlaybackSnapshot) -> Vec<TransportIntent> {
        let mut intents = vec![
            if snapshot.is_playing {
                TransportIntent::Play
            } else {
                TransportIntent::Pause
            },
            TransportIntent::Seek(snapshot.position),
        ];
        if (snapshot.rate - 1.0).abs() > RATE_UNITY_TOLERANCE {
            intents.push(TransportIntent::Rate(snapshot.rate));
        }
        intents
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_counts_as_change() {
        let mut reconciler = StateReconciler::new();
        assert!(reconciler.observe_roster(1));
        assert!(!reconciler.observe_roster(1));
    }

    #[test]
    fn test_growth_and_shrink_both_trigger() {
        let mut reconciler = StateReconciler::new();
        reconciler.observe_roster(2);
        assert!(reconciler.observe_roster(3));
        assert!(reconciler.observe_roster(2));
        assert!(!reconciler.observe_roster(2));
    }

    #[test]
    fn test_resync_pair_while_playing() {
        let intents = StateReconciler::resync_intents(PlaybackSnapshot {
            position: 42.0,
            is_playing: true,
            rate: 1.0,
        });
        assert_eq!(
            intents,
            vec![TransportIntent::Play, TransportIntent::Seek(42.0)]
        );
    }

    #[test]
    fn test_resync_pair_while_paused() {
        let intents = StateReconciler::resync_intents(PlaybackSnapshot {
            position: 10.5,
            is_playing: false,
            rate: 1.0,
        });
        assert_eq!(
            intents,
            vec![TransportIntent::Pause, TransportIntent::Seek(10.5)]
        );
    }

    #[test]
    fn test_resync_includes_off_unity_rate() {
        let intents = StateReconciler::resync_intents(PlaybackSnapshot {
            position: 0.0,
            is_playing: true,
            rate: 1.5,
        });
        assert_eq!(intents.len(), 3);
        assert_eq!(intents[2], TransportIntent::Rate(1.5));
    }
}
