//! Wire protocol for watch-party playback coordination.
//!
//! This crate defines the two message shapes that cross the relay
//! channel: transport commands originated by the session host, and
//! full-membership roster snapshots. Messages are JSON on the wire;
//! the relay itself is transport-agnostic and out of scope here.

#![warn(clippy::pedantic)]

pub mod codec;
pub mod wire;
