//! In-process relay server.
//!
//! `SimServer` plays the remote side of the protocol: it accepts one
//! connection per participant, tracks room membership, assigns server ids to
//! messages, fans them out, relays typing signals and maintains unread counts
//! for participants who are not in the room. It also backs [`SimApi`] with
//! history, rosters and read acknowledgements.
//!
//! All methods are synchronous; delivery to a connected participant is an
//! unbounded channel push, so nothing here blocks.
//!
//! [`SimApi`]: crate::SimApi

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_proto::{
    Conversation, ConversationId, Envelope, InboundEvent, Message, MessageId, OutboundEvent,
    Participant, ParticipantId, TypingPayload, UnreadCountPayload,
};
use thiserror::Error;
use tokio::sync::mpsc;

/// Simulated server failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Handshake refused for this participant.
    #[error("handshake refused for {0}")]
    Refused(ParticipantId),

    /// Participant has no open connection.
    #[error("{0} is not connected")]
    NotConnected(ParticipantId),

    /// Event could not be decoded.
    #[error("bad event: {0}")]
    BadEvent(String),

    /// Conversation does not exist.
    #[error("unknown conversation {0}")]
    UnknownConversation(ConversationId),

    /// Failure injected by the test.
    #[error("injected failure: {0}")]
    Injected(String),
}

/// Server behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimServerConfig {
    /// Echo the sender's `clientId` on broadcast messages.
    pub echo_client_id: bool,
    /// Relay typing signals back to their sender as well.
    pub echo_typing: bool,
}

impl Default for SimServerConfig {
    fn default() -> Self {
        Self { echo_client_id: true, echo_typing: false }
    }
}

#[derive(Debug, Clone)]
struct ConversationRecord {
    participants: [ParticipantId; 2],
}

#[derive(Default)]
struct ServerState {
    config: SimServerConfig,
    participants: HashMap<ParticipantId, Participant>,
    conversations: BTreeMap<ConversationId, ConversationRecord>,
    connections: HashMap<ParticipantId, mpsc::UnboundedSender<Envelope>>,
    rooms: HashMap<ConversationId, BTreeSet<ParticipantId>>,
    messages: HashMap<ConversationId, Vec<Message>>,
    unread: HashMap<(ConversationId, ParticipantId), u32>,
    received: HashMap<ParticipantId, Vec<OutboundEvent>>,
    refused: HashSet<ParticipantId>,
    history_failures: HashSet<ConversationId>,
    mark_read_failures: HashSet<ConversationId>,
    next_message: u64,
    clock: u64,
}

/// Shared handle to the simulated server. Clones refer to the same server.
#[derive(Clone, Default)]
pub struct SimServer {
    state: Arc<Mutex<ServerState>>,
}

impl SimServer {
    /// Server with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Server with the given behavior.
    pub fn with_config(config: SimServerConfig) -> Self {
        let server = Self::default();
        server.lock().config = config;
        server
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a participant profile.
    pub fn add_participant(&self, id: impl Into<ParticipantId>, display_name: &str) {
        let id = id.into();
        let participant =
            Participant { id: id.clone(), display_name: display_name.to_owned(), avatar_url: None };
        self.lock().participants.insert(id, participant);
    }

    /// Create a two-party conversation.
    pub fn create_conversation(
        &self,
        id: impl Into<ConversationId>,
        a: impl Into<ParticipantId>,
        b: impl Into<ParticipantId>,
    ) {
        let record = ConversationRecord { participants: [a.into(), b.into()] };
        self.lock().conversations.insert(id.into(), record);
    }

    /// Store a message as if it had been sent earlier.
    pub fn seed_message(
        &self,
        conversation_id: impl Into<ConversationId>,
        sender_id: impl Into<ParticipantId>,
        text: &str,
    ) -> Message {
        self.lock().store(conversation_id.into(), sender_id.into(), text.to_owned(), None)
    }

    /// Refuse future handshakes from `participant_id`.
    pub fn refuse(&self, participant_id: impl Into<ParticipantId>) {
        self.lock().refused.insert(participant_id.into());
    }

    /// Accept handshakes from `participant_id` again.
    pub fn accept(&self, participant_id: &ParticipantId) {
        self.lock().refused.remove(participant_id);
    }

    /// Make history fetches for `conversation_id` fail.
    pub fn fail_history(&self, conversation_id: impl Into<ConversationId>) {
        self.lock().history_failures.insert(conversation_id.into());
    }

    /// Make read acknowledgements for `conversation_id` fail.
    pub fn fail_mark_read(&self, conversation_id: impl Into<ConversationId>) {
        self.lock().mark_read_failures.insert(conversation_id.into());
    }

    /// Open a connection. Envelopes for the participant arrive on the
    /// returned receiver; a previous connection is replaced.
    ///
    /// # Errors
    ///
    /// - `SimError::Refused` if the participant is refused
    pub fn connect(
        &self,
        participant_id: &ParticipantId,
    ) -> Result<mpsc::UnboundedReceiver<Envelope>, SimError> {
        let mut state = self.lock();
        if state.refused.contains(participant_id) {
            return Err(SimError::Refused(participant_id.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.connections.insert(participant_id.clone(), tx);
        tracing::debug!(participant = %participant_id, "sim connection opened");
        Ok(rx)
    }

    /// Drop a participant's connection from the server side. The
    /// participant leaves every room.
    pub fn disconnect(&self, participant_id: &ParticipantId) {
        let mut state = self.lock();
        state.connections.remove(participant_id);
        for members in state.rooms.values_mut() {
            members.remove(participant_id);
        }
        tracing::debug!(participant = %participant_id, "sim connection dropped");
    }

    /// `true` if the participant has an open connection.
    pub fn is_connected(&self, participant_id: &ParticipantId) -> bool {
        self.lock().connections.get(participant_id).is_some_and(|tx| !tx.is_closed())
    }

    /// Process an envelope sent by `participant_id`.
    ///
    /// # Errors
    ///
    /// - `SimError::NotConnected` if the participant has no connection
    /// - `SimError::BadEvent` if the envelope is not a client event
    pub fn receive(&self, participant_id: &ParticipantId, envelope: &Envelope) -> Result<(), SimError> {
        let mut state = self.lock();
        if !state.connections.contains_key(participant_id) {
            return Err(SimError::NotConnected(participant_id.clone()));
        }

        let event = OutboundEvent::from_envelope(envelope)
            .map_err(|e| SimError::BadEvent(e.to_string()))?;
        state.received.entry(participant_id.clone()).or_default().push(event.clone());

        match event {
            OutboundEvent::JoinRoom(conversation_id) => {
                state.rooms.entry(conversation_id).or_default().insert(participant_id.clone());
            },
            OutboundEvent::LeaveRoom(conversation_id) => {
                if let Some(members) = state.rooms.get_mut(&conversation_id) {
                    members.remove(participant_id);
                }
            },
            OutboundEvent::SendMessage(payload) => {
                let client_id = state.config.echo_client_id.then_some(payload.client_id);
                let message =
                    state.store(payload.conversation_id, payload.sender_id, payload.text, client_id);
                state.fan_out(&message);
            },
            OutboundEvent::Typing(payload) => {
                state.relay_typing(participant_id, InboundEvent::Typing(payload));
            },
            OutboundEvent::StopTyping(payload) => {
                state.relay_typing(participant_id, InboundEvent::StopTyping(payload));
            },
        }
        Ok(())
    }

    /// Push an arbitrary event to a connected participant.
    ///
    /// # Errors
    ///
    /// - `SimError::NotConnected` if the participant has no connection
    pub fn inject(&self, participant_id: &ParticipantId, event: &InboundEvent) -> Result<(), SimError> {
        let state = self.lock();
        let envelope = event.to_envelope().map_err(|e| SimError::BadEvent(e.to_string()))?;
        if state.deliver(participant_id, envelope) {
            Ok(())
        } else {
            Err(SimError::NotConnected(participant_id.clone()))
        }
    }

    /// Events received from `participant_id`, in arrival order.
    pub fn received(&self, participant_id: &ParticipantId) -> Vec<OutboundEvent> {
        self.lock().received.get(participant_id).cloned().unwrap_or_default()
    }

    /// Participants currently joined to a room.
    pub fn room_members(&self, conversation_id: &ConversationId) -> Vec<ParticipantId> {
        self.lock()
            .rooms
            .get(conversation_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Stored messages of a conversation.
    ///
    /// # Errors
    ///
    /// - `SimError::Injected` if history failure was injected
    /// - `SimError::UnknownConversation` if the conversation does not exist
    pub fn history(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, SimError> {
        let state = self.lock();
        if state.history_failures.contains(conversation_id) {
            return Err(SimError::Injected(format!("history for {conversation_id}")));
        }
        if !state.conversations.contains_key(conversation_id) {
            return Err(SimError::UnknownConversation(conversation_id.clone()));
        }
        Ok(state.messages.get(conversation_id).cloned().unwrap_or_default())
    }

    /// Roster of `participant_id`, as the REST endpoint would return it.
    pub fn roster(&self, participant_id: &ParticipantId) -> Vec<Conversation> {
        let state = self.lock();
        state
            .conversations
            .iter()
            .filter(|(_, record)| record.participants.contains(participant_id))
            .filter_map(|(id, record)| {
                let other_id = record.participants.iter().find(|p| *p != participant_id)?;
                let other_participant = state.participants.get(other_id).cloned().unwrap_or_else(
                    || Participant {
                        id: other_id.clone(),
                        display_name: other_id.to_string(),
                        avatar_url: None,
                    },
                );
                Some(Conversation {
                    id: id.clone(),
                    participant_ids: record.participants.to_vec(),
                    other_participant,
                    last_message_preview: state
                        .messages
                        .get(id)
                        .and_then(|messages| messages.last())
                        .map(|m| m.text.clone()),
                    unread_count: state.unread_count(id, participant_id),
                })
            })
            .collect()
    }

    /// Zero a participant's unread count.
    ///
    /// # Errors
    ///
    /// - `SimError::Injected` if read failure was injected
    pub fn mark_read(
        &self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
    ) -> Result<(), SimError> {
        let mut state = self.lock();
        if state.mark_read_failures.contains(conversation_id) {
            return Err(SimError::Injected(format!("mark read for {conversation_id}")));
        }
        state.unread.insert((conversation_id.clone(), participant_id.clone()), 0);
        Ok(())
    }

    /// Server-side unread count.
    pub fn unread(&self, conversation_id: &ConversationId, participant_id: &ParticipantId) -> u32 {
        self.lock().unread_count(conversation_id, participant_id)
    }
}

impl ServerState {
    fn store(
        &mut self,
        conversation_id: ConversationId,
        sender_id: ParticipantId,
        text: String,
        client_id: Option<MessageId>,
    ) -> Message {
        self.next_message += 1;
        self.clock += 1;
        let message = Message {
            id: MessageId::new(format!("srv-{}", self.next_message)),
            conversation_id: conversation_id.clone(),
            sender_id,
            text,
            sent_at: self.clock,
            client_id,
        };
        self.messages.entry(conversation_id).or_default().push(message.clone());
        message
    }

    /// Deliver a message to every connected participant of its conversation
    /// and bump unread counts for those not in the room.
    fn fan_out(&mut self, message: &Message) {
        let Some(record) = self.conversations.get(&message.conversation_id).cloned() else {
            tracing::warn!(conversation = %message.conversation_id, "message for unknown conversation");
            return;
        };
        let in_room = self.rooms.get(&message.conversation_id).cloned().unwrap_or_default();

        for participant in &record.participants {
            if *participant != message.sender_id && !in_room.contains(participant) {
                let key = (message.conversation_id.clone(), participant.clone());
                let count = self.unread.entry(key).or_insert(0);
                *count += 1;
                let update = InboundEvent::UpdateUnreadCount(UnreadCountPayload {
                    conversation_id: message.conversation_id.clone(),
                    unread_count: *count,
                });
                self.deliver_event(participant, &update);
            }
            self.deliver_event(participant, &InboundEvent::Message(message.clone()));
        }
    }

    fn relay_typing(&self, sender: &ParticipantId, event: InboundEvent) {
        let payload: &TypingPayload = match &event {
            InboundEvent::Typing(p) | InboundEvent::StopTyping(p) => p,
            InboundEvent::Message(_) | InboundEvent::UpdateUnreadCount(_) => return,
        };
        let Some(members) = self.rooms.get(&payload.conversation_id) else {
            return;
        };
        for member in members {
            if member != sender || self.config.echo_typing {
                self.deliver_event(member, &event);
            }
        }
    }

    fn deliver_event(&self, participant_id: &ParticipantId, event: &InboundEvent) {
        match event.to_envelope() {
            Ok(envelope) => {
                self.deliver(participant_id, envelope);
            },
            Err(error) => tracing::warn!(%error, "sim server failed to encode event"),
        }
    }

    fn deliver(&self, participant_id: &ParticipantId, envelope: Envelope) -> bool {
        self.connections.get(participant_id).is_some_and(|tx| tx.send(envelope).is_ok())
    }

    fn unread_count(&self, conversation_id: &ConversationId, participant_id: &ParticipantId) -> u32 {
        self.unread.get(&(conversation_id.clone(), participant_id.clone())).copied().unwrap_or(0)
    }
}
