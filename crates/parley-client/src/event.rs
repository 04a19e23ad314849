//! Client events and actions.

use parley_core::{ActivationId, ChannelAction};
use parley_proto::{Conversation, ConversationId, Envelope, Message, ParticipantId};

use crate::error::ClientError;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reporting transport state and received envelopes
/// - Completing the fetches requested through [`ClientAction`]
/// - Forwarding user intents (open a conversation, send, edit the draft)
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Start the session: open the channel.
    Connect,

    /// Transport handshake completed.
    ChannelConnected,

    /// Transport failed to connect or dropped.
    ChannelDisconnected {
        /// Human-readable cause.
        reason: String,
    },

    /// Envelope received from the server.
    EnvelopeReceived(Envelope),

    /// A screen for this conversation mounted.
    Activate(ConversationId),

    /// The conversation screen unmounted.
    Deactivate,

    /// Conversation opened from the list: mark it read, then activate it.
    OpenConversation(ConversationId),

    /// History fetch for an activation completed.
    HistoryLoaded {
        /// Activation the fetch was issued for.
        activation: ActivationId,
        /// Messages in server order.
        messages: Vec<Message>,
    },

    /// History fetch for an activation failed.
    HistoryFailed {
        /// Activation the fetch was issued for.
        activation: ActivationId,
        /// Collaborator error.
        reason: String,
    },

    /// Request a fresh conversation roster.
    RefreshRoster,

    /// Roster fetch completed.
    RosterLoaded(Vec<Conversation>),

    /// Roster fetch failed.
    RosterFailed {
        /// Collaborator error.
        reason: String,
    },

    /// User sends the current draft.
    SendMessage(String),

    /// User edited the draft.
    DraftChanged(String),

    /// Mark a conversation read.
    MarkRead(ConversationId),

    /// Read acknowledgement accepted by the server.
    ReadAcknowledged(ConversationId),

    /// Read acknowledgement rejected or failed in transit.
    ReadAckFailed {
        /// Conversation marked read.
        conversation_id: ConversationId,
        /// Collaborator error.
        reason: String,
    },

    /// End the session.
    Close,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Execute a channel action on the transport.
    Channel(ChannelAction),

    /// Fetch history for an activation.
    ///
    /// The caller feeds the outcome back as `HistoryLoaded` or
    /// `HistoryFailed` carrying the same activation.
    FetchHistory {
        /// Conversation to fetch.
        conversation_id: ConversationId,
        /// Activation the result belongs to.
        activation: ActivationId,
    },

    /// Fetch the conversation roster.
    FetchRoster {
        /// Local participant.
        participant_id: ParticipantId,
    },

    /// Post a read acknowledgement.
    PostMarkRead {
        /// Conversation marked read.
        conversation_id: ConversationId,
        /// Local participant.
        participant_id: ParticipantId,
    },

    /// Something visible changed; re-render.
    ViewChanged,

    /// Non-fatal failure to surface to the user.
    Report(ClientError),
}
