//! Error types for the synchronization core.
//!
//! Transport failures are reported, never fatal: callers surface them as UI
//! state and decide whether to retry. State-machine misuse is reported through
//! the same types so it can be logged instead of panicking.

use parley_proto::ProtocolError;
use thiserror::Error;

use crate::{channel::ChannelState, room::ActivationId};

/// Errors from the connection channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Emit attempted while the channel is not connected.
    #[error("channel not connected (state: {state:?})")]
    NotConnected {
        /// State at the time of the emit
        state: ChannelState,
    },

    /// Channel was closed at session end and cannot be reused.
    #[error("channel closed")]
    Closed,

    /// Session identity was empty.
    #[error("session identity is required")]
    AnonymousIdentity,

    /// Event could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ChannelError {
    /// Returns true if the operation may succeed once connectivity returns.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected { .. })
    }
}

/// Errors from the room membership state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Operation not valid in the current state.
    #[error("invalid room transition: cannot {operation} while {state}")]
    InvalidTransition {
        /// Current state name
        state: &'static str,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Result belongs to an activation that is no longer current.
    #[error("stale activation {got} (current: {current:?})")]
    StaleActivation {
        /// Activation the result was issued for
        got: ActivationId,
        /// Current activation, if any
        current: Option<ActivationId>,
    },
}

/// Errors from the message timeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Local append before the timeline was seeded for a conversation.
    #[error("timeline has no active conversation")]
    Unseeded,

    /// Message text was empty after trimming whitespace.
    #[error("message text is empty")]
    EmptyText,
}
