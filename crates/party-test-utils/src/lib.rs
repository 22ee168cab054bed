//! Test utilities for the watch-party playback coordination engine.
//!
//! - [`FakePlayerAdapter`]: a scripted player with clamping and
//!   per-command apply counters, for idempotence and echo assertions
//! - [`LoopbackRelay`]: an in-process broadcast channel that delivers
//!   every publish to every subscriber, the publisher included
//! - [`fixtures`]: roster snapshot builders
//! - [`eventually`]: poll an assertion until it holds or times out

pub mod fake_adapter;
pub mod fixtures;
pub mod loopback_relay;

pub use fake_adapter::FakePlayerAdapter;
pub use loopback_relay::{LoopbackRelay, LoopbackSink};

use std::time::Duration;

/// Poll `condition` every few milliseconds until it returns true or
/// `timeout` elapses.
///
/// # Panics
///
/// Panics if the condition does not hold within the timeout.
pub async fn eventually<F>(timeout: Duration, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {timeout:?}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
