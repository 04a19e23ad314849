//! Simulated REST collaborator backed by [`SimServer`].
//!
//! History fetches can be held back with [`SimApi::pause_history`] to
//! exercise the window between activation and seeding.

use std::sync::Arc;

use async_trait::async_trait;
use parley_app::{ApiError, ChatApi};
use parley_proto::{Conversation, ConversationId, Message, ParticipantId};
use tokio::sync::watch;

use crate::sim_server::{SimError, SimServer};

/// [`ChatApi`] over a [`SimServer`].
#[derive(Clone)]
pub struct SimApi {
    server: SimServer,
    history_gate: Arc<watch::Sender<bool>>,
}

impl SimApi {
    /// API served by `server`.
    pub fn new(server: SimServer) -> Self {
        let (history_gate, _) = watch::channel(true);
        Self { server, history_gate: Arc::new(history_gate) }
    }

    /// Hold history responses until [`SimApi::resume_history`].
    pub fn pause_history(&self) {
        self.history_gate.send_replace(false);
    }

    /// Release held and future history responses.
    pub fn resume_history(&self) {
        self.history_gate.send_replace(true);
    }
}

fn api_error(error: SimError) -> ApiError {
    match error {
        SimError::UnknownConversation(id) => {
            ApiError::Status { status: 404, message: format!("conversation {id} not found") }
        },
        SimError::Injected(reason) => ApiError::Status { status: 500, message: reason },
        other => ApiError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ChatApi for SimApi {
    async fn fetch_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ApiError> {
        let mut gate = self.history_gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(ApiError::Unavailable("history gate dropped".into()));
        }
        self.server.history(conversation_id).map_err(api_error)
    }

    async fn fetch_conversations(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<Vec<Conversation>, ApiError> {
        Ok(self.server.roster(participant_id))
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
    ) -> Result<(), ApiError> {
        self.server.mark_read(conversation_id, participant_id).map_err(api_error)
    }
}
