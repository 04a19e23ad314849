//! Render snapshot.

use parley_core::{ChannelState, ConversationList, RoomState, TimelineEntry};
use parley_proto::ParticipantId;

/// Everything a screen needs to render, captured at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    /// Connection state, including the last disconnect reason.
    pub connection: ChannelState,
    /// Room membership state.
    pub room: RoomState,
    /// Timeline of the active conversation.
    pub timeline: Vec<TimelineEntry>,
    /// Remote participants typing in the active conversation.
    pub typing: Vec<ParticipantId>,
    /// Conversation list.
    pub conversations: ConversationList,
    /// Most recent reported failure, cleared on reconnect.
    pub last_error: Option<String>,
}

impl ClientView {
    /// `true` if the other side is typing in the active conversation.
    pub fn is_typing(&self) -> bool {
        !self.typing.is_empty()
    }
}
