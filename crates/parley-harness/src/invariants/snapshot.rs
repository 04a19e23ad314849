//! Observable state snapshots for invariant checking.

use parley_client::{Client, ClientView};
use parley_core::{
    ChannelState, ConversationList, MergePolicy, RoomState, Scope, TimelineEntry,
    env::Environment,
};
use parley_proto::{ConversationId, ParticipantId};

/// Observable state of one session at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Local participant.
    pub participant: ParticipantId,
    /// Connection state.
    pub connection: ChannelState,
    /// Room lifecycle state.
    pub room: RoomState,
    /// Timeline entries.
    pub timeline: Vec<TimelineEntry>,
    /// Merge policy the timeline runs under.
    pub merge_policy: MergePolicy,
    /// Participants shown as typing.
    pub typing: Vec<ParticipantId>,
    /// Conversation list.
    pub conversations: ConversationList,
    /// Scopes holding channel handlers. `None` when captured from a view,
    /// which does not expose the channel.
    pub handler_scopes: Option<Vec<Scope>>,
}

impl SessionSnapshot {
    /// Snapshot with no room and no data.
    pub fn idle(participant: ParticipantId) -> Self {
        Self {
            participant,
            connection: ChannelState::Disconnected { reason: None },
            room: RoomState::Idle,
            timeline: Vec::new(),
            merge_policy: MergePolicy::default(),
            typing: Vec::new(),
            conversations: ConversationList::default(),
            handler_scopes: Some(vec![Scope::Session]),
        }
    }

    /// Capture a sans-IO client, including its channel handlers.
    pub fn from_client<E: Environment>(client: &Client<E>) -> Self {
        let mut snapshot = Self::from_view(
            client.identity().clone(),
            client.timeline().policy(),
            &client.view(),
        );
        snapshot.handler_scopes = Some(client.channel().active_scopes());
        snapshot
    }

    /// Capture a published view.
    pub fn from_view(
        participant: ParticipantId,
        merge_policy: MergePolicy,
        view: &ClientView,
    ) -> Self {
        Self {
            participant,
            connection: view.connection.clone(),
            room: view.room.clone(),
            timeline: view.timeline.clone(),
            merge_policy,
            typing: view.typing.clone(),
            conversations: view.conversations.clone(),
            handler_scopes: None,
        }
    }

    /// Conversation of the room state, if any.
    pub fn active_conversation(&self) -> Option<&ConversationId> {
        match &self.room {
            RoomState::Idle => None,
            RoomState::Joining { conversation_id, .. }
            | RoomState::Joined { conversation_id, .. }
            | RoomState::Leaving { conversation_id, .. } => Some(conversation_id),
        }
    }
}
