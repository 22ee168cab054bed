//! Engine configuration.
//!
//! Configuration is loaded from environment variables with documented
//! defaults; every knob also has a programmatic setter for embedders
//! that configure in code.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default session mailbox buffer size.
pub const DEFAULT_MAILBOX_BUFFER: usize = 200;

/// Default cap on commands queued while the player is loading.
pub const DEFAULT_PENDING_QUEUE_CAP: usize = 64;

/// Default TTL for in-progress UI selections, in seconds.
pub const DEFAULT_SELECTION_TTL_SECONDS: u64 = 300;

/// Default sweep interval for the selection store, in seconds.
pub const DEFAULT_SELECTION_SWEEP_SECONDS: u64 = 5;

/// Playback coordination engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Session actor mailbox buffer size.
    pub mailbox_buffer: usize,

    /// Maximum inbound commands held while the player is loading.
    /// Overflow drops the oldest entry.
    pub pending_queue_cap: usize,

    /// Lifetime of an in-progress UI selection.
    pub selection_ttl: Duration,

    /// How often expired selections are swept.
    pub selection_sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mailbox_buffer: DEFAULT_MAILBOX_BUFFER,
            pending_queue_cap: DEFAULT_PENDING_QUEUE_CAP,
            selection_ttl: Duration::from_secs(DEFAULT_SELECTION_TTL_SECONDS),
            selection_sweep_interval: Duration::from_secs(DEFAULT_SELECTION_SWEEP_SECONDS),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that failed to parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// Recognized variables: `PARTY_MAILBOX_BUFFER`,
    /// `PARTY_PENDING_QUEUE_CAP`, `PARTY_SELECTION_TTL_SECONDS`,
    /// `PARTY_SELECTION_SWEEP_SECONDS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a set variable fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = parse_var::<usize>("PARTY_MAILBOX_BUFFER")? {
            config.mailbox_buffer = value;
        }
        if let Some(value) = parse_var::<usize>("PARTY_PENDING_QUEUE_CAP")? {
            config.pending_queue_cap = value;
        }
        if let Some(value) = parse_var::<u64>("PARTY_SELECTION_TTL_SECONDS")? {
            config.selection_ttl = Duration::from_secs(value);
        }
        if let Some(value) = parse_var::<u64>("PARTY_SELECTION_SWEEP_SECONDS")? {
            config.selection_sweep_interval = Duration::from_secs(value);
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mailbox_buffer, DEFAULT_MAILBOX_BUFFER);
        assert_eq!(config.pending_queue_cap, DEFAULT_PENDING_QUEUE_CAP);
        assert_eq!(
            config.selection_ttl,
            Duration::from_secs(DEFAULT_SELECTION_TTL_SECONDS)
        );
    }

    #[test]
    fn test_invalid_value_rejected() {
        // Env mutation is process-global; use a variable no other test
        // touches.
        env::set_var("PARTY_PENDING_QUEUE_CAP", "not-a-number");
        let result = EngineConfig::from_env();
        env::remove_var("PARTY_PENDING_QUEUE_CAP");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
