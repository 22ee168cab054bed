//! party-sim
//!
//! Loopback demonstration of the playback coordination engine: three
//! participants share an in-process relay channel, the earliest joiner
//! becomes host, and a short scripted run shows command propagation,
//! echo suppression and late-join reconciliation.
//!
//! # Run
//!
//! ```text
//! RUST_LOG=party_sim=info,party_engine=debug cargo run --bin party-sim
//! ```

#![warn(clippy::pedantic)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use party_engine::actors::{SessionActor, SessionActorHandle};
use party_engine::adapter::{AdapterError, AdapterEvent, PlaybackSnapshot, PlayerAdapter};
use party_engine::config::EngineConfig;
use party_engine::errors::EngineError;
use party_engine::relay::RelaySink;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Relay channel capacity for the simulation.
const RELAY_CAPACITY: usize = 64;

/// Shared-state player standing in for the real media element.
#[derive(Clone)]
struct SimPlayer {
    name: &'static str,
    state: Arc<Mutex<PlaybackSnapshot>>,
}

impl SimPlayer {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(PlaybackSnapshot::default())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlaybackSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Local user action, as the UI would drive the player directly.
    fn user_seek(&self, position: f64) {
        self.lock().position = position;
    }

    fn user_play(&self) {
        self.lock().is_playing = true;
    }
}

impl PlayerAdapter for SimPlayer {
    fn play(&mut self) -> Result<(), AdapterError> {
        self.lock().is_playing = true;
        info!(target: "party_sim", player = self.name, "-> play");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AdapterError> {
        self.lock().is_playing = false;
        info!(target: "party_sim", player = self.name, "-> pause");
        Ok(())
    }

    fn set_position(&mut self, seconds: f64) -> Result<(), AdapterError> {
        self.lock().position = seconds.max(0.0);
        info!(target: "party_sim", player = self.name, seconds, "-> seek");
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), AdapterError> {
        self.lock().rate = rate;
        info!(target: "party_sim", player = self.name, rate, "-> rate");
        Ok(())
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        *self.lock()
    }
}

/// Publish side of the in-process relay.
#[derive(Clone)]
struct SimSink {
    tx: broadcast::Sender<Bytes>,
}

impl RelaySink for SimSink {
    fn publish(&self, payload: Bytes) -> Result<(), EngineError> {
        self.tx
            .send(payload)
            .map(|_| ())
            .map_err(|e| EngineError::RelayPublish(e.to_string()))
    }
}

/// Spawn one participant and pump relay deliveries into its mailbox.
fn spawn_participant(
    tx: &broadcast::Sender<Bytes>,
    session_id: &str,
    id: &'static str,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> (SessionActorHandle, SimPlayer) {
    let player = SimPlayer::new(id);
    let (handle, _task) = SessionActor::spawn(
        session_id.to_string(),
        id.to_string(),
        id.to_string(),
        Box::new(player.clone()),
        Box::new(SimSink { tx: tx.clone() }),
        config,
        cancel.child_token(),
    );

    let mut rx = tx.subscribe();
    let pump_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    if pump_handle.inbound(payload).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    (handle, player)
}

fn roster(entries: &[(&str, i64)]) -> party_protocol::wire::RosterSnapshotMsg {
    party_protocol::wire::RosterSnapshotMsg {
        participants: entries
            .iter()
            .map(|(id, joined_at)| party_protocol::wire::ParticipantEntry {
                id: (*id).to_string(),
                joined_at: *joined_at,
                display_name: (*id).to_string(),
                avatar_ref: None,
            })
            .collect(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "party_sim=info,party_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(target: "party_sim", "Starting watch-party loopback simulation");

    let config = EngineConfig::from_env()?;
    let session_id = uuid::Uuid::new_v4().to_string();
    let cancel = CancellationToken::new();
    let (tx, _) = broadcast::channel::<Bytes>(RELAY_CAPACITY);

    let (alice, alice_player) = spawn_participant(&tx, &session_id, "alice", &config, &cancel);
    let (bob, _bob_player) = spawn_participant(&tx, &session_id, "bob", &config, &cancel);

    // Alice joined first, so every participant elects her host.
    for handle in [&alice, &bob] {
        handle
            .roster_update(roster(&[("alice", 0), ("bob", 5_000)]))
            .await?;
        handle.adapter_event(AdapterEvent::Ready).await?;
    }

    // Host seeks to 42s and starts playback; the commands fan out.
    alice_player.user_seek(42.0);
    alice.adapter_event(AdapterEvent::Seeked(42.0)).await?;
    alice_player.user_play();
    alice.adapter_event(AdapterEvent::Played).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Carol joins mid-session; the roster growth makes the host
    // re-broadcast its state and carol catches up.
    let (carol, carol_player) = spawn_participant(&tx, &session_id, "carol", &config, &cancel);
    let full_roster = roster(&[("alice", 0), ("bob", 5_000), ("carol", 60_000)]);
    carol.roster_update(full_roster.clone()).await?;
    carol.adapter_event(AdapterEvent::Ready).await?;
    for handle in [&alice, &bob] {
        handle.roster_update(full_roster.clone()).await?;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    for (name, handle) in [("alice", &alice), ("bob", &bob), ("carol", &carol)] {
        let view = handle.view().await?;
        info!(
            target: "party_sim",
            participant = name,
            host = ?view.host_id,
            is_host = view.is_local_host,
            position = view.playback.position,
            playing = view.playback.is_playing,
            "Final state"
        );
    }

    let converged = carol_player.snapshot();
    info!(
        target: "party_sim",
        position = converged.position,
        playing = converged.is_playing,
        "Late joiner converged"
    );

    cancel.cancel();
    Ok(())
}
