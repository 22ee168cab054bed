//! The `PlayerAdapter` seam.
//!
//! The engine treats the concrete media element as a black box behind
//! this trait: imperative transport controls in, transport events out.
//! Adapters are responsible for clamping — a seek target outside
//! `[0, duration]` is clamped to the valid range, a rate outside the
//! supported set is clamped to the nearest supported value; neither is
//! rejected upstream.

use serde::Serialize;
use thiserror::Error;

/// Playback rates the original player UI offered; the default clamp set
/// for adapters that don't declare their own.
pub const DEFAULT_PLAYBACK_RATES: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

/// Error type for adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The media element failed to initialize or load the stream.
    #[error("Failed to start playback: {0}")]
    FailedToStart(String),

    /// The media element went away mid-session.
    #[error("Player unavailable: {0}")]
    Unavailable(String),
}

/// The authoritative instantaneous playback state, computable at any
/// time by querying the local player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    /// Current position in seconds.
    pub position: f64,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Current rate multiplier.
    pub rate: f32,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            position: 0.0,
            is_playing: false,
            rate: 1.0,
        }
    }
}

/// Abstract local media-playback control surface.
///
/// All operations are idempotent from the engine's point of view:
/// pausing an already-paused player or seeking to the current position
/// must be observable as "no state change", never as an error.
pub trait PlayerAdapter: Send {
    /// Resume playback.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unavailable.
    fn play(&mut self) -> Result<(), AdapterError>;

    /// Halt playback, keeping position.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unavailable.
    fn pause(&mut self) -> Result<(), AdapterError>;

    /// Jump to an absolute position in seconds, clamped to
    /// `[0, duration]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unavailable.
    fn set_position(&mut self, seconds: f64) -> Result<(), AdapterError>;

    /// Change the rate multiplier, clamped to the supported set.
    ///
    /// # Errors
    ///
    /// Returns an error if the player is unavailable.
    fn set_rate(&mut self, rate: f32) -> Result<(), AdapterError>;

    /// Current playback state.
    fn snapshot(&self) -> PlaybackSnapshot;
}

/// Transport events emitted by the concrete media element, fed into the
/// session actor's mailbox by the embedding layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// The stream is loaded and playable.
    Ready,
    /// Playback started (user action or applied command).
    Played,
    /// Playback halted.
    Paused,
    /// A seek completed; carries the landing position in seconds.
    Seeked(f64),
    /// The rate multiplier changed.
    RateChanged(f32),
    /// The player failed to initialize. Terminal for playback.
    Failed(String),
}
