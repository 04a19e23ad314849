//! Client error types.

use parley_core::{ChannelError, RoomError, TimelineError};
use parley_proto::{ConversationId, ProtocolError};
use thiserror::Error;

/// Errors from client operations.
///
/// Precondition violations are returned from [`Client::handle`] and change
/// nothing. Collaborator and transport failures are reported through
/// [`ClientAction::Report`] while the client carries on.
///
/// [`Client::handle`]: crate::Client::handle
/// [`ClientAction::Report`]: crate::ClientAction::Report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Send attempted without a joined room.
    #[error("no active room")]
    NoActiveRoom,

    /// Channel operation failed.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Room lifecycle misuse.
    #[error("room error: {0}")]
    Room(#[from] RoomError),

    /// Timeline rejected the operation.
    #[error("timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Event could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Roster entry is not a two-party conversation of the local participant.
    #[error("invalid conversation {conversation_id}")]
    InvalidConversation {
        /// Rejected conversation.
        conversation_id: ConversationId,
    },

    /// History fetch failed; the room opened with an empty timeline.
    #[error("history unavailable for {conversation_id}: {reason}")]
    HistoryUnavailable {
        /// Conversation being activated.
        conversation_id: ConversationId,
        /// Collaborator error.
        reason: String,
    },

    /// Conversation roster fetch failed.
    #[error("roster unavailable: {reason}")]
    RosterUnavailable {
        /// Collaborator error.
        reason: String,
    },

    /// Read acknowledgement failed. The local count stays zero.
    #[error("read acknowledgement failed for {conversation_id}: {reason}")]
    ReadAckFailed {
        /// Conversation marked read.
        conversation_id: ConversationId,
        /// Collaborator error.
        reason: String,
    },
}

impl ClientError {
    /// Returns true if retrying the operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Channel(e) => e.is_transient(),
            Self::HistoryUnavailable { .. }
            | Self::RosterUnavailable { .. }
            | Self::ReadAckFailed { .. } => true,
            Self::NoActiveRoom
            | Self::Room(_)
            | Self::Timeline(_)
            | Self::Protocol(_)
            | Self::InvalidConversation { .. } => false,
        }
    }
}
