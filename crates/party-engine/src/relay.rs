//! Command relay: host-gated publication and inbound dispatch.
//!
//! Outbound: only the elected host may publish, and publication is
//! fire-and-forget — a failed publish is logged and abandoned because
//! idempotent re-application plus roster-driven re-broadcast self-heal
//! a missed message.
//!
//! Inbound: every relay delivery lands here, including the local
//! participant's own broadcasts when the relay is not self-filtering.
//! The origin check runs before any side effect; commands that arrive
//! before the player is ready are queued and drained on `Ready`.

use crate::adapter::PlayerAdapter;
use crate::election::HostState;
use crate::errors::EngineError;
use bytes::Bytes;
use party_protocol::codec;
use party_protocol::wire::WireCommand;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Tolerance when matching a `Seeked` event against the inbound seek
/// that caused it (float position round-trips through the player).
const SEEK_ECHO_TOLERANCE: f64 = 0.25;

/// Abstract broadcast primitive for the command channel.
///
/// Implementations publish to every session participant, possibly
/// including the publisher itself. At-most-once from the engine's point
/// of view; the transport may still duplicate or reorder.
pub trait RelaySink: Send {
    /// Publish an encoded command, fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns an error on transient delivery failure. Callers log and
    /// move on; they never retry.
    fn publish(&self, payload: Bytes) -> Result<(), EngineError>;
}

/// A local transport intent, before it becomes a wire command.
///
/// Intents come from the host's own player events; non-host intents are
/// dropped at the publish gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportIntent {
    /// Resume playback.
    Play,
    /// Halt playback.
    Pause,
    /// Jump to an absolute position in seconds.
    Seek(f64),
    /// Change the rate multiplier.
    Rate(f32),
}

impl TransportIntent {
    fn into_wire(self, origin_id: &str) -> WireCommand {
        let origin_id = origin_id.to_string();
        match self {
            Self::Play => WireCommand::Play { origin_id },
            Self::Pause => WireCommand::Pause { origin_id },
            Self::Seek(time) => WireCommand::Seek { origin_id, time },
            Self::Rate(rate) => WireCommand::Rate { origin_id, rate },
        }
    }
}

/// What happened to one inbound relay delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundDisposition {
    /// Dispatched to the player adapter.
    Applied,
    /// Held until the adapter signals ready.
    Queued,
    /// Discarded: the local participant's own broadcast.
    Echo,
    /// Discarded: unknown type or missing required field.
    Invalid,
}

/// Local player load state, as the relay sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterPhase {
    /// Stream still loading; inbound commands are queued.
    Loading,
    /// Stream playable; inbound commands dispatch immediately.
    Ready,
}

/// Serializes local intents onto the channel and dispatches inbound
/// commands to the player adapter.
#[derive(Debug)]
pub struct CommandRelay {
    local_id: String,
    phase: AdapterPhase,
    pending: VecDeque<WireCommand>,
    pending_cap: usize,
    /// Target of an inbound seek currently being applied; the matching
    /// `Seeked` event must not turn into an outbound command.
    seek_guard: Option<f64>,
}

impl CommandRelay {
    /// Create a relay for the given local participant.
    #[must_use]
    pub fn new(local_id: String, pending_cap: usize) -> Self {
        Self {
            local_id,
            phase: AdapterPhase::Loading,
            pending: VecDeque::new(),
            pending_cap,
            seek_guard: None,
        }
    }

    /// Current adapter phase.
    #[must_use]
    pub fn phase(&self) -> AdapterPhase {
        self.phase
    }

    /// Number of commands waiting for the adapter to become ready.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Publish a local intent if — and only if — the local participant
    /// is the elected host. Returns whether anything was published.
    ///
    /// The host does not apply its own command through this path; its
    /// player already acted, which is what produced the intent.
    pub fn publish_if_host(
        &self,
        host_state: &HostState,
        sink: &dyn RelaySink,
        intent: TransportIntent,
    ) -> bool {
        if !host_state.is_local_host(&self.local_id) {
            trace!(
                target: "party.relay",
                ?intent,
                "Suppressing publish: local participant is not host"
            );
            return false;
        }

        let command = intent.into_wire(&self.local_id);
        let payload = match codec::encode_command(&command) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(target: "party.relay", error = %e, "Failed to encode command");
                return false;
            }
        };

        match sink.publish(payload) {
            Ok(()) => {
                debug!(target: "party.relay", kind = command.kind(), "Published command");
                true
            }
            Err(e) => {
                // Transient delivery failure: logged, not retried. The
                // next state change or re-broadcast self-heals.
                warn!(target: "party.relay", error = %e, "Publish failed");
                false
            }
        }
    }

    /// Handle one raw delivery from the relay channel.
    ///
    /// Malformed payloads and self-originated echoes are discarded
    /// before any side effect; this function never fails.
    pub fn on_inbound(
        &mut self,
        payload: &[u8],
        adapter: &mut dyn PlayerAdapter,
    ) -> InboundDisposition {
        let command = match codec::decode_command(payload) {
            Ok(command) => command,
            Err(e) => {
                debug!(target: "party.relay", error = %e, "Discarding malformed message");
                return InboundDisposition::Invalid;
            }
        };

        if command.origin_id() == self.local_id {
            trace!(target: "party.relay", kind = command.kind(), "Discarding own echo");
            return InboundDisposition::Echo;
        }

        if self.phase == AdapterPhase::Loading {
            if self.pending.len() >= self.pending_cap {
                // Later commands supersede earlier ones under
                // idempotence, so dropping the oldest is safe.
                self.pending.pop_front();
            }
            debug!(
                target: "party.relay",
                kind = command.kind(),
                queued = self.pending.len() + 1,
                "Queuing command until player is ready"
            );
            self.pending.push_back(command);
            return InboundDisposition::Queued;
        }

        self.apply(command, adapter);
        InboundDisposition::Applied
    }

    /// Mark the adapter ready and drain the pre-ready queue in arrival
    /// order. Returns the number of commands replayed.
    pub fn on_ready(&mut self, adapter: &mut dyn PlayerAdapter) -> usize {
        self.phase = AdapterPhase::Ready;
        let drained = self.pending.len();
        while let Some(command) = self.pending.pop_front() {
            self.apply(command, adapter);
        }
        drained
    }

    /// Check whether a `Seeked` event at `position` is the echo of an
    /// inbound seek this relay just applied. Consumes the guard.
    pub fn take_seek_guard(&mut self, position: f64) -> bool {
        match self.seek_guard.take() {
            Some(target) if (target - position).abs() <= SEEK_ECHO_TOLERANCE => true,
            Some(target) => {
                // Guard was stale (player clamped or the user seeked
                // again); let the event through.
                trace!(
                    target: "party.relay",
                    target_pos = target,
                    actual = position,
                    "Seek guard mismatch"
                );
                false
            }
            None => false,
        }
    }

    fn apply(&mut self, command: WireCommand, adapter: &mut dyn PlayerAdapter) {
        trace!(target: "party.relay", kind = command.kind(), "Applying inbound command");
        let result = match command {
            WireCommand::Play { .. } => adapter.play(),
            WireCommand::Pause { .. } => adapter.pause(),
            WireCommand::Seek { time, .. } => {
                self.seek_guard = Some(time);
                adapter.set_position(time)
            }
            WireCommand::Rate { rate, .. } => adapter.set_rate(rate),
        };
        if let Err(e) = result {
            warn!(target: "party.relay", error = %e, "Adapter rejected inbound command");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use party_protocol::wire::{ParticipantEntry, RosterSnapshotMsg};
    use std::sync::{Arc, Mutex};

    /// Minimal adapter that records applications.
    #[derive(Default)]
    struct RecordingAdapter {
        position: f64,
        playing: bool,
        rate: f32,
        applications: usize,
    }

    impl PlayerAdapter for RecordingAdapter {
        fn play(&mut self) -> Result<(), crate::adapter::AdapterError> {
            self.playing = true;
            self.applications += 1;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), crate::adapter::AdapterError> {
            self.playing = false;
            self.applications += 1;
            Ok(())
        }

        fn set_position(&mut self, seconds: f64) -> Result<(), crate::adapter::AdapterError> {
            self.position = seconds;
            self.applications += 1;
            Ok(())
        }

        fn set_rate(&mut self, rate: f32) -> Result<(), crate::adapter::AdapterError> {
            self.rate = rate;
            self.applications += 1;
            Ok(())
        }

        fn snapshot(&self) -> crate::adapter::PlaybackSnapshot {
            crate::adapter::PlaybackSnapshot {
                position: self.position,
                is_playing: self.playing,
                rate: self.rate,
            }
        }
    }

    #[derive(Clone, Default)]
    struct CapturingSink {
        published: Arc<Mutex<Vec<Bytes>>>,
    }

    impl RelaySink for CapturingSink {
        fn publish(&self, payload: Bytes) -> Result<(), EngineError> {
            self.published
                .lock()
                .unwrap()
                .push(payload);
            Ok(())
        }
    }

    fn host_state_for(local: &str, others: &[(&str, i64)]) -> HostState {
        let mut roster = Roster::new();
        let mut participants: Vec<ParticipantEntry> = others
            .iter()
            .map(|(id, joined_at)| ParticipantEntry {
                id: (*id).to_string(),
                joined_at: *joined_at,
                display_name: (*id).to_string(),
                avatar_ref: None,
            })
            .collect();
        participants.push(ParticipantEntry {
            id: local.to_string(),
            joined_at: 0,
            display_name: local.to_string(),
            avatar_ref: None,
        });
        roster.update(RosterSnapshotMsg { participants });
        let mut host_state = HostState::undetermined();
        host_state.recompute(&roster);
        host_state
    }

    #[test]
    fn test_publish_gated_on_host() {
        let sink = CapturingSink::default();
        let relay = CommandRelay::new("b".to_string(), 8);
        // "a" joined earlier, so "b" is not host.
        let mut roster = Roster::new();
        roster.update(RosterSnapshotMsg {
            participants: vec![
                ParticipantEntry {
                    id: "a".to_string(),
                    joined_at: 0,
                    display_name: "a".to_string(),
                    avatar_ref: None,
                },
                ParticipantEntry {
                    id: "b".to_string(),
                    joined_at: 5,
                    display_name: "b".to_string(),
                    avatar_ref: None,
                },
            ],
        });
        let mut host_state = HostState::undetermined();
        host_state.recompute(&roster);

        assert!(!relay.publish_if_host(&host_state, &sink, TransportIntent::Play));
        assert!(sink.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_publish_suppressed_while_undetermined() {
        let sink = CapturingSink::default();
        let relay = CommandRelay::new("a".to_string(), 8);
        let host_state = HostState::undetermined();
        assert!(!relay.publish_if_host(&host_state, &sink, TransportIntent::Pause));
        assert!(sink.published.lock().unwrap().is_empty());
    }

    #[test]
    fn test_host_publish_carries_origin() {
        let sink = CapturingSink::default();
        let relay = CommandRelay::new("a".to_string(), 8);
        let host_state = host_state_for("a", &[("b", 5)]);

        assert!(relay.publish_if_host(&host_state, &sink, TransportIntent::Seek(42.0)));
        let published = sink.published.lock().unwrap();
        let command = codec::decode_command(&published[0]).unwrap();
        assert_eq!(command.origin_id(), "a");
        assert_eq!(command.kind(), "SEEK");
    }

    #[test]
    fn test_echo_is_discarded_before_side_effects() {
        let mut relay = CommandRelay::new("a".to_string(), 8);
        let mut adapter = RecordingAdapter::default();
        relay.on_ready(&mut adapter);

        let own = codec::encode_command(&WireCommand::Pause {
            origin_id: "a".to_string(),
        })
        .unwrap();
        assert_eq!(
            relay.on_inbound(&own, &mut adapter),
            InboundDisposition::Echo
        );
        assert_eq!(adapter.applications, 0);
    }

    #[test]
    fn test_malformed_inbound_is_discarded() {
        let mut relay = CommandRelay::new("a".to_string(), 8);
        let mut adapter = RecordingAdapter::default();
        relay.on_ready(&mut adapter);

        assert_eq!(
            relay.on_inbound(b"{\"type\":\"NOPE\"}", &mut adapter),
            InboundDisposition::Invalid
        );
        assert_eq!(adapter.applications, 0);
    }

    #[test]
    fn test_commands_queue_until_ready() {
        let mut relay = CommandRelay::new("b".to_string(), 8);
        let mut adapter = RecordingAdapter::default();

        let seek = codec::encode_command(&WireCommand::Seek {
            origin_id: "a".to_string(),
            time: 42.0,
        })
        .unwrap();
        let play = codec::encode_command(&WireCommand::Play {
            origin_id: "a".to_string(),
        })
        .unwrap();

        assert_eq!(
            relay.on_inbound(&seek, &mut adapter),
            InboundDisposition::Queued
        );
        assert_eq!(
            relay.on_inbound(&play, &mut adapter),
            InboundDisposition::Queued
        );
        assert_eq!(adapter.applications, 0);
        assert_eq!(relay.pending_len(), 2);

        let drained = relay.on_ready(&mut adapter);
        assert_eq!(drained, 2);
        assert_eq!(adapter.applications, 2);
        assert!((adapter.position - 42.0).abs() < f64::EPSILON);
        assert!(adapter.playing);
    }

    #[test]
    fn test_queue_overflow_drops_oldest() {
        let mut relay = CommandRelay::new("b".to_string(), 2);
        let mut adapter = RecordingAdapter::default();

        for time in [1.0, 2.0, 3.0] {
            let payload = codec::encode_command(&WireCommand::Seek {
                origin_id: "a".to_string(),
                time,
            })
            .unwrap();
            relay.on_inbound(&payload, &mut adapter);
        }

        assert_eq!(relay.pending_len(), 2);
        relay.on_ready(&mut adapter);
        // Last seek wins; the dropped one was superseded anyway.
        assert!((adapter.position - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_seek_guard_consumed_once() {
        let mut relay = CommandRelay::new("b".to_string(), 8);
        let mut adapter = RecordingAdapter::default();
        relay.on_ready(&mut adapter);

        let seek = codec::encode_command(&WireCommand::Seek {
            origin_id: "a".to_string(),
            time: 120.0,
        })
        .unwrap();
        relay.on_inbound(&seek, &mut adapter);

        assert!(relay.take_seek_guard(120.0));
        // Second event at the same position is a genuine local seek.
        assert!(!relay.take_seek_guard(120.0));
    }

    #[test]
    fn test_stale_seek_guard_lets_event_through() {
        let mut relay = CommandRelay::new("b".to_string(), 8);
        let mut adapter = RecordingAdapter::default();
        relay.on_ready(&mut adapter);

        let seek = codec::encode_command(&WireCommand::Seek {
            origin_id: "a".to_string(),
            time: 120.0,
        })
        .unwrap();
        relay.on_inbound(&seek, &mut adapter);

        assert!(!relay.take_seek_guard(900.0));
    }
}
