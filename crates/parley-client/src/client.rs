//! Client state machine.
//!
//! The `Client` owns the session's single [`Channel`] and every
//! synchronization component. Screens never touch the channel directly: they
//! feed intents in as [`ClientEvent`]s and render [`ClientView`] snapshots.
//!
//! # Activation
//!
//! ```text
//! Activate(c) ──> leave previous room ──> FetchHistory(c, a)
//!                                               │
//!                HistoryLoaded(a) / HistoryFailed(a)
//!                                               v
//!                          seed timeline, mark seeded
//!                                               │ channel connected
//!                                               v
//!                  emit joinRoom, subscribe handlers under scope a
//! ```
//!
//! Handlers for `message`, `typing` and `stopTyping` are registered under the
//! activation's [`Scope`] and all removed together when the room is left,
//! whichever way it is left. Conversation-list handlers live for the session.

use parley_core::{
    ActivationId, Channel, ChannelState, Composer, ComposerSignal, ConversationList,
    ConversationListProjector, MergeOutcome, RoomTracker, Scope, Timeline, TypingTracker,
    UnreadLedger, env::Environment,
};
use parley_proto::{
    Conversation, ConversationId, Envelope, EventName, InboundEvent, Message, OutboundEvent,
    ParticipantId, SendMessagePayload, TypingPayload,
};

use crate::{
    config::ClientConfig,
    error::ClientError,
    event::{ClientAction, ClientEvent},
    view::ClientView,
};

/// Routing target of a channel subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// `message` for any conversation: refresh the list preview.
    Preview,
    /// `updateUnreadCount`: apply to the ledger.
    Unread,
    /// `message` for the active room: merge into the timeline.
    Timeline {
        /// Room the handler was registered for.
        conversation_id: ConversationId,
        /// Activation the handler belongs to.
        activation: ActivationId,
    },
    /// `typing` for the active room.
    TypingStart {
        /// Room the handler was registered for.
        conversation_id: ConversationId,
        /// Activation the handler belongs to.
        activation: ActivationId,
    },
    /// `stopTyping` for the active room.
    TypingStop {
        /// Room the handler was registered for.
        conversation_id: ConversationId,
        /// Activation the handler belongs to.
        activation: ActivationId,
    },
}

/// Chat client for one session.
pub struct Client<E: Environment> {
    /// Environment for timestamps and client-generated ids.
    env: E,

    /// Session configuration.
    config: ClientConfig,

    /// The session's only channel.
    channel: Channel<Handler>,

    /// Active room lifecycle.
    room: RoomTracker,

    /// Messages of the active room.
    timeline: Timeline,

    /// Remote typing presence in the active room.
    typing: TypingTracker,

    /// Local typing announcements.
    composer: Composer,

    /// Unread counts for every known conversation.
    ledger: UnreadLedger,

    /// Conversation list model.
    projector: ConversationListProjector,

    /// Most recent reported failure.
    last_error: Option<String>,
}

impl<E: Environment> Client<E> {
    /// Create a client and register its session-scoped handlers.
    ///
    /// # Errors
    ///
    /// - `ClientError::Channel` if the configured identity is empty
    pub fn new(env: E, config: ClientConfig) -> Result<Self, ClientError> {
        let mut channel = Channel::new(config.identity.clone())?;
        channel.subscribe(EventName::Message, Scope::Session, Handler::Preview);
        channel.subscribe(EventName::UpdateUnreadCount, Scope::Session, Handler::Unread);

        Ok(Self {
            env,
            channel,
            room: RoomTracker::new(),
            timeline: Timeline::new(config.merge_policy),
            typing: TypingTracker::new(config.identity.clone()),
            composer: Composer::default(),
            ledger: UnreadLedger::new(),
            projector: ConversationListProjector::new(config.empty_preview.clone()),
            config,
            last_error: None,
        })
    }

    /// Local participant.
    pub fn identity(&self) -> &ParticipantId {
        &self.config.identity
    }

    /// Session channel.
    pub fn channel(&self) -> &Channel<Handler> {
        &self.channel
    }

    /// Room lifecycle.
    pub fn room(&self) -> &RoomTracker {
        &self.room
    }

    /// Active timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Remote typing presence.
    pub fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Unread counts.
    pub fn ledger(&self) -> &UnreadLedger {
        &self.ledger
    }

    /// Most recent reported failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Project the conversation list.
    pub fn conversations(&self) -> ConversationList {
        self.projector.project(&self.ledger, self.room.conversation())
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> ClientView {
        ClientView {
            connection: self.channel.state().clone(),
            room: self.room.state().clone(),
            timeline: self.timeline.entries().to_vec(),
            typing: self.typing.typing_participants().cloned().collect(),
            conversations: self.conversations(),
            last_error: self.last_error.clone(),
        }
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns an error, with no state changed, when the event violates a
    /// precondition:
    /// - `ClientError::NoActiveRoom` for a send without a joined room
    /// - `ClientError::Timeline` for a send with blank text
    /// - `ClientError::Channel` for connecting a closed session
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Connect => self.handle_connect(),
            ClientEvent::ChannelConnected => Ok(self.handle_connected()),
            ClientEvent::ChannelDisconnected { reason } => Ok(self.handle_disconnected(reason)),
            ClientEvent::EnvelopeReceived(envelope) => Ok(self.handle_envelope(&envelope)),
            ClientEvent::Activate(conversation_id) => self.handle_activate(conversation_id),
            ClientEvent::Deactivate => Ok(self.handle_deactivate()),
            ClientEvent::OpenConversation(conversation_id) => {
                self.handle_open_conversation(conversation_id)
            },
            ClientEvent::HistoryLoaded { activation, messages } => {
                Ok(self.handle_history(activation, Ok(messages)))
            },
            ClientEvent::HistoryFailed { activation, reason } => {
                Ok(self.handle_history(activation, Err(reason)))
            },
            ClientEvent::RefreshRoster => Ok(vec![ClientAction::FetchRoster {
                participant_id: self.config.identity.clone(),
            }]),
            ClientEvent::RosterLoaded(roster) => Ok(self.handle_roster(roster)),
            ClientEvent::RosterFailed { reason } => {
                let mut actions = Vec::new();
                self.report(ClientError::RosterUnavailable { reason }, &mut actions);
                Ok(actions)
            },
            ClientEvent::SendMessage(text) => self.handle_send_message(text),
            ClientEvent::DraftChanged(draft) => Ok(self.handle_draft_changed(&draft)),
            ClientEvent::MarkRead(conversation_id) => Ok(self.handle_mark_read(conversation_id)),
            ClientEvent::ReadAcknowledged(conversation_id) => {
                self.ledger.acknowledge(&conversation_id, true);
                Ok(Vec::new())
            },
            ClientEvent::ReadAckFailed { conversation_id, reason } => {
                self.ledger.acknowledge(&conversation_id, false);
                let mut actions = Vec::new();
                self.report(ClientError::ReadAckFailed { conversation_id, reason }, &mut actions);
                Ok(actions)
            },
            ClientEvent::Close => Ok(self.handle_close()),
        }
    }

    fn handle_connect(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        let mut actions: Vec<_> =
            self.channel.connect()?.into_iter().map(ClientAction::Channel).collect();
        actions.push(ClientAction::ViewChanged);
        Ok(actions)
    }

    fn handle_connected(&mut self) -> Vec<ClientAction> {
        if !self.channel.on_connected() {
            return Vec::new();
        }
        tracing::info!(identity = %self.config.identity, "channel connected");
        self.last_error = None;

        let mut actions = Vec::new();
        self.try_join(&mut actions);
        actions.push(ClientAction::ViewChanged);
        actions
    }

    fn handle_disconnected(&mut self, reason: String) -> Vec<ClientAction> {
        if *self.channel.state() == ChannelState::Closed {
            return Vec::new();
        }
        tracing::warn!(%reason, "channel disconnected");
        self.last_error = Some(reason.clone());
        self.channel.on_disconnected(reason);
        vec![ClientAction::ViewChanged]
    }

    fn handle_envelope(&mut self, envelope: &Envelope) -> Vec<ClientAction> {
        let event = match InboundEvent::from_envelope(envelope) {
            Ok(event) => event,
            Err(error) => {
                tracing::warn!(event = %envelope.event, %error, "dropping undecodable event");
                return Vec::new();
            },
        };

        let handlers: Vec<Handler> = self.channel.handlers(event.name()).cloned().collect();
        if handlers.is_empty() {
            tracing::debug!(event = %event.name(), "no subscriber");
            return Vec::new();
        }

        let mut changed = false;
        for handler in &handlers {
            changed |= self.dispatch(handler, &event);
        }

        if changed { vec![ClientAction::ViewChanged] } else { Vec::new() }
    }

    /// Apply `event` through one handler. Returns `true` if state changed.
    fn dispatch(&mut self, handler: &Handler, event: &InboundEvent) -> bool {
        match (handler, event) {
            (Handler::Preview, InboundEvent::Message(message)) => {
                self.projector.record_message(message);
                true
            },
            (Handler::Unread, InboundEvent::UpdateUnreadCount(update)) => {
                self.ledger.apply_count(update.conversation_id.clone(), update.unread_count)
            },
            (Handler::Timeline { conversation_id, activation }, InboundEvent::Message(message)) => {
                if !self.is_current(conversation_id, *activation) {
                    return false;
                }
                match self.timeline.merge_remote(message.clone()) {
                    MergeOutcome::Ignored => {
                        tracing::debug!(
                            conversation = %message.conversation_id,
                            "message for another room"
                        );
                        false
                    },
                    MergeOutcome::Appended { .. } | MergeOutcome::Replaced { .. } => true,
                }
            },
            (Handler::TypingStart { conversation_id, activation }, InboundEvent::Typing(typing)) => {
                self.is_current(conversation_id, *activation)
                    && self.typing.typing_start(&typing.conversation_id, &typing.participant_id)
            },
            (
                Handler::TypingStop { conversation_id, activation },
                InboundEvent::StopTyping(typing),
            ) => {
                self.is_current(conversation_id, *activation)
                    && self.typing.typing_stop(&typing.conversation_id, &typing.participant_id)
            },
            (handler, event) => {
                tracing::debug!(?handler, event = %event.name(), "handler does not apply");
                false
            },
        }
    }

    fn is_current(&self, conversation_id: &ConversationId, activation: ActivationId) -> bool {
        let current = self.room.is_joined()
            && self.room.activation() == Some(activation)
            && self.room.conversation() == Some(conversation_id);
        if !current {
            tracing::warn!(
                conversation = %conversation_id,
                activation,
                "event for stale activation"
            );
        }
        current
    }

    fn handle_activate(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let mut actions = Vec::new();

        if let Some(current) = self.room.conversation() {
            if *current == conversation_id {
                tracing::debug!(conversation = %conversation_id, "already active");
                return Ok(actions);
            }
            self.leave(&mut actions);
        }

        let activation = self.room.begin_join(conversation_id.clone())?;
        self.timeline.clear();
        self.typing.bind(conversation_id.clone());
        self.composer.reset();
        tracing::info!(conversation = %conversation_id, activation, "activating room");

        actions.push(ClientAction::FetchHistory { conversation_id, activation });
        actions.push(ClientAction::ViewChanged);
        Ok(actions)
    }

    fn handle_deactivate(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if self.leave(&mut actions) {
            actions.push(ClientAction::ViewChanged);
        }
        actions
    }

    fn handle_open_conversation(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let mut actions = self.handle_mark_read(conversation_id.clone());
        actions.extend(self.handle_activate(conversation_id)?);
        Ok(actions)
    }

    fn handle_history(
        &mut self,
        activation: ActivationId,
        outcome: Result<Vec<Message>, String>,
    ) -> Vec<ClientAction> {
        let Some(conversation_id) = self.room.conversation().cloned() else {
            tracing::warn!(activation, "history result with no active room");
            return Vec::new();
        };
        if self.room.activation() != Some(activation) || self.room.is_joined() {
            tracing::warn!(activation, "discarding stale history result");
            return Vec::new();
        }

        let mut actions = Vec::new();
        let history = match outcome {
            Ok(messages) => messages,
            Err(reason) => {
                let error = ClientError::HistoryUnavailable {
                    conversation_id: conversation_id.clone(),
                    reason,
                };
                self.report(error, &mut actions);
                Vec::new()
            },
        };

        if let Some(last) = history.iter().rev().find(|m| m.conversation_id == conversation_id) {
            self.projector.record_message(last);
        }
        tracing::debug!(conversation = %conversation_id, messages = history.len(), "seeding timeline");
        self.timeline.seed(conversation_id, history);

        if let Err(error) = self.room.mark_seeded(activation) {
            tracing::warn!(%error, "seed rejected");
            return actions;
        }

        self.try_join(&mut actions);
        actions.push(ClientAction::ViewChanged);
        actions
    }

    fn handle_roster(&mut self, roster: Vec<Conversation>) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        let mut valid = Vec::with_capacity(roster.len());

        for conversation in roster {
            if conversation.is_valid_for(&self.config.identity) {
                valid.push(conversation);
            } else {
                let error = ClientError::InvalidConversation { conversation_id: conversation.id };
                self.report(error, &mut actions);
            }
        }

        tracing::debug!(conversations = valid.len(), "roster loaded");
        self.ledger.seed_from_roster(&valid);
        self.projector.set_roster(valid);
        actions.push(ClientAction::ViewChanged);
        actions
    }

    fn handle_send_message(&mut self, text: String) -> Result<Vec<ClientAction>, ClientError> {
        let Some(conversation_id) = self.joined_room() else {
            return Err(ClientError::NoActiveRoom);
        };

        let local = self.timeline.append_local(&self.env, text, self.config.identity.clone())?;
        self.projector.record_message(&local);

        let mut actions = Vec::new();
        let payload = SendMessagePayload {
            conversation_id: conversation_id.clone(),
            sender_id: local.sender_id.clone(),
            text: local.text.clone(),
            client_id: local.id.clone(),
        };
        self.emit(&OutboundEvent::SendMessage(payload), &mut actions);

        if let Some(signal) = self.composer.on_sent() {
            self.emit_typing(conversation_id, signal, &mut actions);
        }

        actions.push(ClientAction::ViewChanged);
        Ok(actions)
    }

    fn handle_draft_changed(&mut self, draft: &str) -> Vec<ClientAction> {
        let Some(conversation_id) = self.joined_room() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if let Some(signal) = self.composer.on_draft_changed(draft) {
            self.emit_typing(conversation_id, signal, &mut actions);
        }
        actions
    }

    fn handle_mark_read(&mut self, conversation_id: ConversationId) -> Vec<ClientAction> {
        let previous = self.ledger.mark_read(&conversation_id);
        tracing::debug!(conversation = %conversation_id, previous, "marked read");

        vec![
            ClientAction::PostMarkRead {
                conversation_id,
                participant_id: self.config.identity.clone(),
            },
            ClientAction::ViewChanged,
        ]
    }

    fn handle_close(&mut self) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        self.leave(&mut actions);
        actions.extend(self.channel.close().into_iter().map(ClientAction::Channel));
        tracing::info!("session closed");
        actions.push(ClientAction::ViewChanged);
        actions
    }

    /// Emit `joinRoom` for a seeded activation, or restore membership of the
    /// joined room after a reconnect.
    fn try_join(&mut self, actions: &mut Vec<ClientAction>) {
        if self.room.is_joined() {
            if let Some(conversation_id) = self.room.conversation().cloned() {
                tracing::info!(conversation = %conversation_id, "rejoining room");
                self.emit(&OutboundEvent::JoinRoom(conversation_id), actions);
            }
            return;
        }

        let Some((conversation_id, activation)) = self.room.ready_to_join() else {
            return;
        };
        let conversation_id = conversation_id.clone();

        if !self.channel.is_connected() {
            tracing::debug!(conversation = %conversation_id, "join deferred until connected");
            return;
        }
        if !self.emit(&OutboundEvent::JoinRoom(conversation_id.clone()), actions) {
            return;
        }

        self.subscribe_room(&conversation_id, activation);
        if let Err(error) = self.room.complete_join() {
            tracing::warn!(%error, "join completion rejected");
            return;
        }
        tracing::info!(conversation = %conversation_id, activation, "joined room");
    }

    fn subscribe_room(&mut self, conversation_id: &ConversationId, activation: ActivationId) {
        let scope = Scope::Activation(activation);
        let conversation_id = conversation_id.clone();
        self.channel.subscribe(
            EventName::Message,
            scope,
            Handler::Timeline { conversation_id: conversation_id.clone(), activation },
        );
        self.channel.subscribe(
            EventName::Typing,
            scope,
            Handler::TypingStart { conversation_id: conversation_id.clone(), activation },
        );
        self.channel.subscribe(
            EventName::StopTyping,
            scope,
            Handler::TypingStop { conversation_id, activation },
        );
    }

    /// Tear down the active room. Local teardown completes even when the
    /// `leaveRoom` emit fails. Returns `false` if no room was active.
    fn leave(&mut self, actions: &mut Vec<ClientAction>) -> bool {
        let Some(departure) = self.room.begin_leave() else {
            return false;
        };

        if departure.was_joined {
            if self.composer.is_announced() {
                let payload = TypingPayload {
                    conversation_id: departure.conversation_id.clone(),
                    participant_id: self.config.identity.clone(),
                };
                self.emit(&OutboundEvent::StopTyping(payload), actions);
            }
            self.emit(&OutboundEvent::LeaveRoom(departure.conversation_id.clone()), actions);
        }

        let removed = self.channel.unsubscribe_scope(Scope::Activation(departure.activation));
        self.timeline.clear();
        self.typing.reset();
        self.composer.reset();

        if let Err(error) = self.room.complete_leave() {
            tracing::warn!(%error, "leave completion rejected");
        }
        tracing::info!(
            conversation = %departure.conversation_id,
            activation = departure.activation,
            handlers = removed,
            "left room"
        );
        true
    }

    fn joined_room(&self) -> Option<ConversationId> {
        if self.room.is_joined() { self.room.conversation().cloned() } else { None }
    }

    fn emit_typing(
        &mut self,
        conversation_id: ConversationId,
        signal: ComposerSignal,
        actions: &mut Vec<ClientAction>,
    ) {
        let payload =
            TypingPayload { conversation_id, participant_id: self.config.identity.clone() };
        let event = match signal {
            ComposerSignal::Start => OutboundEvent::Typing(payload),
            ComposerSignal::Stop => OutboundEvent::StopTyping(payload),
        };
        self.emit(&event, actions);
    }

    /// Emit on the channel, reporting failure. Returns `true` on success.
    fn emit(&mut self, event: &OutboundEvent, actions: &mut Vec<ClientAction>) -> bool {
        match self.channel.emit(event) {
            Ok(action) => {
                tracing::debug!(event = %event.name(), conversation = %event.conversation_id(), "emit");
                actions.push(ClientAction::Channel(action));
                true
            },
            Err(error) => {
                self.report(error.into(), actions);
                false
            },
        }
    }

    fn report(&mut self, error: ClientError, actions: &mut Vec<ClientAction>) {
        tracing::warn!(%error, transient = error.is_transient(), "operation failed");
        self.last_error = Some(error.to_string());
        actions.push(ClientAction::Report(error));
    }
}

#[cfg(test)]
mod tests {
    use parley_core::{ChannelAction, RoomState};

    use super::*;

    #[derive(Clone)]
    struct FixedEnv;

    impl Environment for FixedEnv {
        fn unix_millis(&self) -> u64 {
            42
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(7);
        }
    }

    fn client() -> Client<FixedEnv> {
        Client::new(FixedEnv, ClientConfig::new("me")).unwrap()
    }

    fn connected() -> Client<FixedEnv> {
        let mut client = client();
        client.handle(ClientEvent::Connect).unwrap();
        client.handle(ClientEvent::ChannelConnected).unwrap();
        client
    }

    fn sent_events(actions: &[ClientAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                ClientAction::Channel(ChannelAction::Send(envelope)) => Some(envelope.event.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_identity_rejected() {
        assert!(Client::new(FixedEnv, ClientConfig::new("")).is_err());
    }

    #[test]
    fn session_handlers_registered_at_creation() {
        let client = client();
        assert_eq!(client.channel().active_scopes(), vec![Scope::Session]);
    }

    #[test]
    fn join_waits_for_history() {
        let mut client = connected();

        let actions = client.handle(ClientEvent::Activate("c1".into())).unwrap();
        assert!(sent_events(&actions).is_empty());
        assert!(matches!(actions[0], ClientAction::FetchHistory { activation: 1, .. }));

        let actions = client
            .handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() })
            .unwrap();
        assert_eq!(sent_events(&actions), vec!["joinRoom"]);
        assert!(client.room().is_joined());
    }

    #[test]
    fn join_deferred_until_connected() {
        let mut client = client();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        let actions = client
            .handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() })
            .unwrap();

        assert!(sent_events(&actions).is_empty());
        assert!(matches!(client.room().state(), RoomState::Joining { seeded: true, .. }));

        client.handle(ClientEvent::Connect).unwrap();
        let actions = client.handle(ClientEvent::ChannelConnected).unwrap();
        assert_eq!(sent_events(&actions), vec!["joinRoom"]);
    }

    #[test]
    fn history_failure_seeds_empty_and_joins() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();

        let actions = client
            .handle(ClientEvent::HistoryFailed { activation: 1, reason: "503".into() })
            .unwrap();

        assert!(actions.iter().any(|a| matches!(
            a,
            ClientAction::Report(ClientError::HistoryUnavailable { .. })
        )));
        assert_eq!(sent_events(&actions), vec!["joinRoom"]);
        assert!(client.timeline().is_empty());
        assert!(client.last_error().is_some());
    }

    #[test]
    fn stale_history_discarded() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        client.handle(ClientEvent::Activate("c2".into())).unwrap();

        let actions = client
            .handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() })
            .unwrap();

        assert!(actions.is_empty());
        assert!(!client.room().is_joined());
    }

    #[test]
    fn send_without_room_changes_nothing() {
        let mut client = connected();

        assert_eq!(
            client.handle(ClientEvent::SendMessage("hi".into())),
            Err(ClientError::NoActiveRoom)
        );
        assert!(client.timeline().is_empty());
    }

    #[test]
    fn activating_same_room_is_noop() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();

        assert!(client.handle(ClientEvent::Activate("c1".into())).unwrap().is_empty());
        assert_eq!(client.room().activation(), Some(1));
    }

    #[test]
    fn leave_emit_failure_still_tears_down() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        client.handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() }).unwrap();
        client.handle(ClientEvent::ChannelDisconnected { reason: "reset".into() }).unwrap();

        let actions = client.handle(ClientEvent::Deactivate).unwrap();

        assert!(actions.iter().any(|a| matches!(a, ClientAction::Report(e) if e.is_transient())));
        assert_eq!(client.room().state(), &RoomState::Idle);
        assert_eq!(client.channel().active_scopes(), vec![Scope::Session]);
    }

    #[test]
    fn reconnect_rejoins_joined_room() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        client.handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() }).unwrap();
        client.handle(ClientEvent::ChannelDisconnected { reason: "reset".into() }).unwrap();

        let actions = client.handle(ClientEvent::ChannelConnected).unwrap();

        assert_eq!(sent_events(&actions), vec!["joinRoom"]);
        assert!(client.last_error().is_none());
    }

    #[test]
    fn draft_emits_typing_transitions() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        client.handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() }).unwrap();

        let typed = client.handle(ClientEvent::DraftChanged("h".into())).unwrap();
        let again = client.handle(ClientEvent::DraftChanged("hi".into())).unwrap();
        let sent = client.handle(ClientEvent::SendMessage("hi".into())).unwrap();

        assert_eq!(sent_events(&typed), vec!["typing"]);
        assert!(again.is_empty());
        assert_eq!(sent_events(&sent), vec!["sendMessage", "stopTyping"]);
    }

    #[test]
    fn close_leaves_and_closes_channel() {
        let mut client = connected();
        client.handle(ClientEvent::Activate("c1".into())).unwrap();
        client.handle(ClientEvent::HistoryLoaded { activation: 1, messages: Vec::new() }).unwrap();

        let actions = client.handle(ClientEvent::Close).unwrap();

        assert_eq!(sent_events(&actions), vec!["leaveRoom"]);
        assert!(actions.contains(&ClientAction::Channel(ChannelAction::Close)));
        assert_eq!(client.channel().state(), &ChannelState::Closed);
        assert!(client.handle(ClientEvent::Connect).is_err());
    }
}
