//! Playback Coordination Engine
//!
//! This library keeps a group of participants watching one video stream
//! in lockstep: exactly one participant (the "host") originates
//! transport commands, every other participant applies them, and late
//! joiners are reconciled to the current playback state.
//!
//! # Architecture
//!
//! One actor per session membership:
//!
//! ```text
//! SessionActor (one per local participant)
//! ├── owns the Roster (ordered by join time)
//! ├── derives HostState from the roster (never hand-toggled)
//! ├── CommandRelay: echo suppression, host-gated publish, pre-ready queue
//! ├── StateReconciler: roster-change re-broadcast for late joiners
//! └── drives a PlayerAdapter (the abstract local media element)
//! ```
//!
//! All external stimuli — roster snapshots, inbound relay messages,
//! player adapter events — arrive as [`actors::SessionMessage`] values
//! on one mailbox and flow through one central dispatch function, so
//! the ordering and echo-suppression invariants live in one place.
//!
//! # Key Design Decisions
//!
//! - **Host = earliest joiner**: election is a pure function of the
//!   roster snapshot, ties broken by id, so every participant computes
//!   the same winner without an election protocol.
//! - **Commands are idempotent**: the relay may duplicate or reorder;
//!   reapplying a command is a no-op, never an error.
//! - **Re-broadcast on roster change**: the host re-issues its current
//!   state whenever the roster size changes, bounding late-join lag to
//!   one broadcast cycle without a query/response message kind.
//!
//! # Modules
//!
//! - [`actors`] - Session actor and its message types
//! - [`adapter`] - The `PlayerAdapter` seam and its event type
//! - [`config`] - Engine configuration from environment
//! - [`election`] - Host election and derived host state
//! - [`errors`] - Error taxonomy
//! - [`relay`] - Command relay: publish gate, echo filter, dispatch
//! - [`reconciler`] - Late-join state reconciliation
//! - [`roster`] - Participant roster bookkeeping
//! - [`selection`] - Time-bounded store for in-progress UI selections

pub mod actors;
pub mod adapter;
pub mod config;
pub mod election;
pub mod errors;
pub mod reconciler;
pub mod relay;
pub mod roster;
pub mod selection;

pub use adapter::{AdapterEvent, PlaybackSnapshot, PlayerAdapter};
pub use config::EngineConfig;
pub use errors::EngineError;
pub use relay::{RelaySink, TransportIntent};
