//! REST collaborator seam.

use async_trait::async_trait;
use parley_proto::{Conversation, ConversationId, Message, ParticipantId};

use crate::error::ApiError;

/// History, roster and read-acknowledgement endpoints.
///
/// Object-safe so one shared instance serves every spawned fetch.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Messages of a conversation, in server order.
    async fn fetch_messages(&self, conversation_id: &ConversationId)
    -> Result<Vec<Message>, ApiError>;

    /// Conversations the participant belongs to.
    async fn fetch_conversations(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<Conversation>, ApiError>;

    /// Acknowledge that the participant read a conversation.
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
    ) -> Result<(), ApiError>;
}
