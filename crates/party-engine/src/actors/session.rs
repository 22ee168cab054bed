//! `SessionActor` - per-membership actor that owns all sync state.
//!
//! Each `SessionActor`:
//! - Owns the roster, the derived host state, the command relay and the
//!   reconciler for one local session membership
//! - Drives the local `PlayerAdapter` from inbound commands
//! - Publishes the host's transport events to the relay channel
//!
//! The actor never awaits a response to its own published commands:
//! publication is fire-and-forget, and convergence relies on idempotent
//! re-application plus roster-driven re-broadcast.

use crate::adapter::{AdapterEvent, PlayerAdapter};
use crate::config::EngineConfig;
use crate::election::HostState;
use crate::errors::EngineError;
use crate::reconciler::StateReconciler;
use crate::relay::{CommandRelay, RelaySink, TransportIntent};
use crate::roster::{Participant, Roster};

use super::messages::{ParticipantView, SessionMessage, SessionView};

use bytes::Bytes;
use party_protocol::wire::RosterSnapshotMsg;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Handle to a `SessionActor`.
#[derive(Clone)]
pub struct SessionActorHandle {
    sender: mpsc::Sender<SessionMessage>,
    cancel_token: CancellationToken,
    session_id: String,
    local_id: String,
}

impl SessionActorHandle {
    /// Get the session ID.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the local participant ID.
    #[must_use]
    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    /// Deliver a full roster snapshot from the relay.
    pub async fn roster_update(&self, snapshot: RosterSnapshotMsg) -> Result<(), EngineError> {
        self.sender
            .send(SessionMessage::RosterUpdate { snapshot })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))
    }

    /// Deliver a raw payload from the command channel.
    pub async fn inbound(&self, payload: Bytes) -> Result<(), EngineError> {
        self.sender
            .send(SessionMessage::Inbound { payload })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))
    }

    /// Deliver a transport event from the local player adapter.
    pub async fn adapter_event(&self, event: AdapterEvent) -> Result<(), EngineError> {
        self.sender
            .send(SessionMessage::Adapter { event })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))
    }

    /// Ask the host side to re-broadcast its current state now.
    ///
    /// Returns whether a re-broadcast was published (always `false` on
    /// non-host participants).
    pub async fn request_resync(&self) -> Result<bool, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SessionMessage::RequestResync { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))
    }

    /// Get a snapshot of the session.
    pub async fn view(&self) -> Result<SessionView, EngineError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(SessionMessage::GetView { respond_to: tx })
            .await
            .map_err(|e| EngineError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| EngineError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the session actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `SessionActor` implementation.
pub struct SessionActor {
    /// Session ID.
    session_id: String,
    /// Local participant ID.
    local_id: String,
    /// Local display name, for the synthesized roster entry.
    local_display_name: String,
    /// When the local participant first came up, epoch milliseconds.
    local_joined_at: i64,
    /// Message receiver.
    receiver: mpsc::Receiver<SessionMessage>,
    /// Cancellation token.
    cancel_token: CancellationToken,
    /// Live participant set.
    roster: Roster,
    /// Derived single-authority state.
    host_state: HostState,
    /// Publish gate, echo filter and inbound dispatch.
    relay: CommandRelay,
    /// Roster-change re-broadcast bookkeeping.
    reconciler: StateReconciler,
    /// The local media element.
    adapter: Box<dyn PlayerAdapter>,
    /// The broadcast primitive for the command channel.
    sink: Box<dyn RelaySink>,
    /// Set when the player failed to initialize.
    failure: Option<String>,
}

impl SessionActor {
    /// Spawn a new session actor.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        session_id: String,
        local_id: String,
        local_display_name: String,
        adapter: Box<dyn PlayerAdapter>,
        sink: Box<dyn RelaySink>,
        config: &EngineConfig,
        cancel_token: CancellationToken,
    ) -> (SessionActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.mailbox_buffer);

        let actor = Self {
            session_id: session_id.clone(),
            local_id: local_id.clone(),
            local_display_name,
            local_joined_at: chrono::Utc::now().timestamp_millis(),
            receiver,
            cancel_token: cancel_token.clone(),
            roster: Roster::new(),
            host_state: HostState::undetermined(),
            relay: CommandRelay::new(local_id.clone(), config.pending_queue_cap),
            reconciler: StateReconciler::new(),
            adapter,
            sink,
            failure: None,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionActorHandle {
            sender,
            cancel_token,
            session_id,
            local_id,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "party.session", fields(session_id = %self.session_id, local_id = %self.local_id))]
    async fn run(mut self) {
        info!(
            target: "party.session",
            "SessionActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "party.session",
                        "SessionActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(
                                target: "party.session",
                                "SessionActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "party.session",
            participants = self.roster.len(),
            "SessionActor stopped"
        );
    }

    /// Handle a single message. The one place where every invariant is
    /// enforced.
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::RosterUpdate { snapshot } => {
                self.handle_roster_update(snapshot);
            }

            SessionMessage::Inbound { payload } => {
                let disposition = self.relay.on_inbound(&payload, self.adapter.as_mut());
                debug!(target: "party.session", ?disposition, "Inbound message handled");
            }

            SessionMessage::Adapter { event } => {
                self.handle_adapter_event(event);
            }

            SessionMessage::RequestResync { respond_to } => {
                let published = self.rebroadcast_state("resync requested");
                let _ = respond_to.send(published);
            }

            SessionMessage::GetView { respond_to } => {
                let _ = respond_to.send(self.build_view());
            }
        }
    }

    /// Apply a roster snapshot: wholesale replacement, host recompute,
    /// and the host-side re-broadcast obligation on size change.
    fn handle_roster_update(&mut self, snapshot: RosterSnapshotMsg) {
        self.roster.update(snapshot);
        self.roster.ensure_member(Participant {
            id: self.local_id.clone(),
            display_name: self.local_display_name.clone(),
            avatar_ref: None,
            joined_at: self.local_joined_at,
        });

        self.host_state.recompute(&self.roster);
        let size_changed = self.reconciler.observe_roster(self.roster.len());

        info!(
            target: "party.session",
            participants = self.roster.len(),
            host = ?self.host_state.host_id(),
            is_local_host = self.host_state.is_local_host(&self.local_id),
            "Roster updated"
        );

        if size_changed {
            self.rebroadcast_state("roster size changed");
        }
    }

    fn handle_adapter_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::Ready => {
                let drained = self.relay.on_ready(self.adapter.as_mut());
                info!(
                    target: "party.session",
                    drained,
                    "Player ready, queued commands replayed"
                );
            }

            AdapterEvent::Played => {
                self.publish_intent(TransportIntent::Play);
            }

            AdapterEvent::Paused => {
                self.publish_intent(TransportIntent::Pause);
            }

            AdapterEvent::Seeked(position) => {
                if self.relay.take_seek_guard(position) {
                    // This seek was us applying an inbound command;
                    // publishing it would bounce it back around.
                    debug!(
                        target: "party.session",
                        position,
                        "Suppressed seeked event from inbound apply"
                    );
                } else {
                    self.publish_intent(TransportIntent::Seek(position));
                }
            }

            AdapterEvent::RateChanged(rate) => {
                self.publish_intent(TransportIntent::Rate(rate));
            }

            AdapterEvent::Failed(reason) => {
                error!(
                    target: "party.session",
                    reason = %reason,
                    "Player failed to initialize"
                );
                self.failure = Some(reason);
            }
        }
    }

    /// Publish a local transport intent through the host gate.
    fn publish_intent(&mut self, intent: TransportIntent) {
        self.relay
            .publish_if_host(&self.host_state, self.sink.as_ref(), intent);
    }

    /// Re-broadcast the full current playback state so every existing
    /// and newly-joined participant converges. Host only; requires a
    /// ready player (there is no meaningful state to broadcast before
    /// the stream loads).
    fn rebroadcast_state(&mut self, reason: &str) -> bool {
        if !self.host_state.is_local_host(&self.local_id) {
            return false;
        }
        if self.relay.phase() != crate::relay::AdapterPhase::Ready {
            debug!(
                target: "party.session",
                reason,
                "Skipping re-broadcast: player not ready"
            );
            return false;
        }

        let snapshot = self.adapter.snapshot();
        let intents = StateReconciler::resync_intents(snapshot);
        let mut published = false;
        for intent in intents {
            published |= self
                .relay
                .publish_if_host(&self.host_state, self.sink.as_ref(), intent);
        }

        if published {
            info!(
                target: "party.session",
                reason,
                position = snapshot.position,
                is_playing = snapshot.is_playing,
                "Re-broadcast current state"
            );
        } else {
            warn!(
                target: "party.session",
                reason,
                "State re-broadcast published nothing"
            );
        }
        published
    }

    fn build_view(&self) -> SessionView {
        let participants = self
            .roster
            .current()
            .iter()
            .map(|p| ParticipantView {
                id: p.id.clone(),
                display_name: p.display_name.clone(),
                joined_at: p.joined_at,
                is_host: self.host_state.host_id() == Some(p.id.as_str()),
                is_local: p.id == self.local_id,
            })
            .collect();

        SessionView {
            session_id: self.session_id.clone(),
            local_id: self.local_id.clone(),
            host_id: self.host_state.host_id().map(str::to_string),
            is_local_host: self.host_state.is_local_host(&self.local_id),
            participants,
            phase: self.relay.phase(),
            pending_commands: self.relay.pending_len(),
            playback: self.adapter.snapshot(),
            failure: self.failure.clone(),
        }
    }
}
