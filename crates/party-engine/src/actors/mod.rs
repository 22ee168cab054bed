//! Actor model implementation.
//!
//! One `SessionActor` per local session membership; all external
//! stimuli arrive as [`SessionMessage`] values on its mailbox.

pub mod messages;
pub mod session;

pub use messages::{ParticipantView, SessionMessage, SessionView};
pub use session::{SessionActor, SessionActorHandle};
