//! In-memory player adapter fake.
//!
//! Clones share state, so a test can hand one clone to a session actor
//! and keep another for inspection and for simulating local user
//! actions.

use party_engine::adapter::{
    AdapterError, PlaybackSnapshot, PlayerAdapter, DEFAULT_PLAYBACK_RATES,
};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Inner {
    position: f64,
    playing: bool,
    rate: f32,
    duration: f64,
    supported_rates: Vec<f32>,
    play_applications: usize,
    pause_applications: usize,
    seek_applications: usize,
    rate_applications: usize,
    /// Observable state transitions (a reapplied no-op does not count).
    state_changes: usize,
}

/// Fake media element for tests.
///
/// Seeks clamp to `[0, duration]`; rates clamp to the nearest supported
/// value, as the engine requires of real adapters.
#[derive(Debug, Clone)]
pub struct FakePlayerAdapter {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakePlayerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlayerAdapter {
    /// A paused player at position zero with a two-hour duration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                position: 0.0,
                playing: false,
                rate: 1.0,
                duration: 7200.0,
                supported_rates: DEFAULT_PLAYBACK_RATES.to_vec(),
                play_applications: 0,
                pause_applications: 0,
                seek_applications: 0,
                rate_applications: 0,
                state_changes: 0,
            })),
        }
    }

    /// Override the stream duration.
    #[must_use]
    pub fn with_duration(self, duration: f64) -> Self {
        self.lock().duration = duration;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Current position in seconds.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.lock().position
    }

    /// Whether playback is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Current rate multiplier.
    #[must_use]
    pub fn rate(&self) -> f32 {
        self.lock().rate
    }

    /// How many times `play` was applied.
    #[must_use]
    pub fn play_applications(&self) -> usize {
        self.lock().play_applications
    }

    /// How many times `pause` was applied.
    #[must_use]
    pub fn pause_applications(&self) -> usize {
        self.lock().pause_applications
    }

    /// How many times `set_position` was applied.
    #[must_use]
    pub fn seek_applications(&self) -> usize {
        self.lock().seek_applications
    }

    /// How many observable state transitions occurred. Reapplying an
    /// idempotent command does not move this counter.
    #[must_use]
    pub fn state_changes(&self) -> usize {
        self.lock().state_changes
    }

    // ------------------------------------------------------------------
    // Local user simulation (the "UI" acting on the player directly)
    // ------------------------------------------------------------------

    /// Simulate the local user pressing play.
    pub fn simulate_play(&self) {
        let mut inner = self.lock();
        if !inner.playing {
            inner.playing = true;
            inner.state_changes += 1;
        }
    }

    /// Simulate the local user pressing pause.
    pub fn simulate_pause(&self) {
        let mut inner = self.lock();
        if inner.playing {
            inner.playing = false;
            inner.state_changes += 1;
        }
    }

    /// Simulate the local user dragging the seek bar.
    pub fn simulate_seek(&self, position: f64) {
        let mut inner = self.lock();
        let clamped = position.clamp(0.0, inner.duration);
        if (clamped - inner.position).abs() > f64::EPSILON {
            inner.position = clamped;
            inner.state_changes += 1;
        }
    }
}

impl PlayerAdapter for FakePlayerAdapter {
    fn play(&mut self) -> Result<(), AdapterError> {
        let mut inner = self.lock();
        inner.play_applications += 1;
        if !inner.playing {
            inner.playing = true;
            inner.state_changes += 1;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AdapterError> {
        let mut inner = self.lock();
        inner.pause_applications += 1;
        if inner.playing {
            inner.playing = false;
            inner.state_changes += 1;
        }
        Ok(())
    }

    fn set_position(&mut self, seconds: f64) -> Result<(), AdapterError> {
        let mut inner = self.lock();
        inner.seek_applications += 1;
        let clamped = seconds.clamp(0.0, inner.duration);
        if (clamped - inner.position).abs() > f64::EPSILON {
            inner.position = clamped;
            inner.state_changes += 1;
        }
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) -> Result<(), AdapterError> {
        let mut inner = self.lock();
        inner.rate_applications += 1;
        let clamped = inner
            .supported_rates
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - rate)
                    .abs()
                    .partial_cmp(&(b - rate).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(1.0);
        if (clamped - inner.rate).abs() > f32::EPSILON {
            inner.rate = clamped;
            inner.state_changes += 1;
        }
        Ok(())
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        let inner = self.lock();
        PlaybackSnapshot {
            position: inner.position,
            is_playing: inner.playing,
            rate: inner.rate,
        }
    }
}
