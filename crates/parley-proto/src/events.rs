//! Typed channel events.
//!
//! # Invariants
//!
//! Each event variant maps to exactly one [`EventName`]. `typing` and
//! `stopTyping` travel in both directions with the same payload; every other
//! name is valid in one direction only and decoding it in the other direction
//! is an error.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    ConversationId, Envelope, Message, MessageId, ParticipantId,
    errors::{ProtocolError, Result},
};

/// Every event name understood by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// Client joins a conversation's room.
    JoinRoom,
    /// Client leaves a conversation's room.
    LeaveRoom,
    /// Client sends a message.
    SendMessage,
    /// Participant started typing.
    Typing,
    /// Participant stopped typing.
    StopTyping,
    /// Server delivers a message.
    Message,
    /// Server reports a conversation's unread count changed.
    UpdateUnreadCount,
}

impl EventName {
    /// All names, in declaration order.
    pub const ALL: [EventName; 7] = [
        EventName::JoinRoom,
        EventName::LeaveRoom,
        EventName::SendMessage,
        EventName::Typing,
        EventName::StopTyping,
        EventName::Message,
        EventName::UpdateUnreadCount,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::JoinRoom => "joinRoom",
            EventName::LeaveRoom => "leaveRoom",
            EventName::SendMessage => "sendMessage",
            EventName::Typing => "typing",
            EventName::StopTyping => "stopTyping",
            EventName::Message => "message",
            EventName::UpdateUnreadCount => "updateUnreadCount",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        EventName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownEvent(s.to_owned()))
    }
}

/// Payload of `typing` / `stopTyping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Conversation the signal is scoped to.
    pub conversation_id: ConversationId,
    /// Participant who is (or stopped) typing.
    pub participant_id: ParticipantId,
}

/// Payload of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Target conversation.
    pub conversation_id: ConversationId,
    /// Author (the local participant).
    pub sender_id: ParticipantId,
    /// Message body.
    pub text: String,
    /// Correlation id of the optimistic entry.
    pub client_id: MessageId,
}

/// Payload of `updateUnreadCount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountPayload {
    /// Conversation whose count changed.
    pub conversation_id: ConversationId,
    /// New unread count.
    pub unread_count: u32,
}

/// Events the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Join a conversation's room.
    JoinRoom(ConversationId),
    /// Leave a conversation's room.
    LeaveRoom(ConversationId),
    /// Send a message.
    SendMessage(SendMessagePayload),
    /// Local participant started typing.
    Typing(TypingPayload),
    /// Local participant stopped typing.
    StopTyping(TypingPayload),
}

impl OutboundEvent {
    /// Event name of this variant.
    pub fn name(&self) -> EventName {
        match self {
            OutboundEvent::JoinRoom(_) => EventName::JoinRoom,
            OutboundEvent::LeaveRoom(_) => EventName::LeaveRoom,
            OutboundEvent::SendMessage(_) => EventName::SendMessage,
            OutboundEvent::Typing(_) => EventName::Typing,
            OutboundEvent::StopTyping(_) => EventName::StopTyping,
        }
    }

    /// Conversation the event is scoped to.
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            OutboundEvent::JoinRoom(id) | OutboundEvent::LeaveRoom(id) => id,
            OutboundEvent::SendMessage(p) => &p.conversation_id,
            OutboundEvent::Typing(p) | OutboundEvent::StopTyping(p) => &p.conversation_id,
        }
    }

    /// Wrap into a wire envelope.
    pub fn to_envelope(&self) -> Result<Envelope> {
        let name = self.name();
        let payload = match self {
            OutboundEvent::JoinRoom(id) | OutboundEvent::LeaveRoom(id) => to_value(name, id),
            OutboundEvent::SendMessage(p) => to_value(name, p),
            OutboundEvent::Typing(p) | OutboundEvent::StopTyping(p) => to_value(name, p),
        }?;
        Ok(Envelope::new(name, payload))
    }

    /// Parse an envelope received from a client (server side).
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let name: EventName = envelope.event.parse()?;
        match name {
            EventName::JoinRoom => Ok(OutboundEvent::JoinRoom(from_value(name, envelope)?)),
            EventName::LeaveRoom => Ok(OutboundEvent::LeaveRoom(from_value(name, envelope)?)),
            EventName::SendMessage => Ok(OutboundEvent::SendMessage(from_value(name, envelope)?)),
            EventName::Typing => Ok(OutboundEvent::Typing(from_value(name, envelope)?)),
            EventName::StopTyping => Ok(OutboundEvent::StopTyping(from_value(name, envelope)?)),
            EventName::Message | EventName::UpdateUnreadCount => {
                Err(ProtocolError::UnexpectedDirection {
                    event: envelope.event.clone(),
                    direction: "outbound",
                })
            },
        }
    }
}

/// Events the server delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// New or echoed message.
    Message(Message),
    /// Remote participant started typing.
    Typing(TypingPayload),
    /// Remote participant stopped typing.
    StopTyping(TypingPayload),
    /// Unread count for a conversation changed.
    UpdateUnreadCount(UnreadCountPayload),
}

impl InboundEvent {
    /// Event name of this variant.
    pub fn name(&self) -> EventName {
        match self {
            InboundEvent::Message(_) => EventName::Message,
            InboundEvent::Typing(_) => EventName::Typing,
            InboundEvent::StopTyping(_) => EventName::StopTyping,
            InboundEvent::UpdateUnreadCount(_) => EventName::UpdateUnreadCount,
        }
    }

    /// Conversation the event is scoped to.
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            InboundEvent::Message(m) => &m.conversation_id,
            InboundEvent::Typing(p) | InboundEvent::StopTyping(p) => &p.conversation_id,
            InboundEvent::UpdateUnreadCount(p) => &p.conversation_id,
        }
    }

    /// Wrap into a wire envelope (server side).
    pub fn to_envelope(&self) -> Result<Envelope> {
        let name = self.name();
        let payload = match self {
            InboundEvent::Message(m) => to_value(name, m),
            InboundEvent::Typing(p) | InboundEvent::StopTyping(p) => to_value(name, p),
            InboundEvent::UpdateUnreadCount(p) => to_value(name, p),
        }?;
        Ok(Envelope::new(name, payload))
    }

    /// Parse an envelope received from the server.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let name: EventName = envelope.event.parse()?;
        match name {
            EventName::Message => Ok(InboundEvent::Message(from_value(name, envelope)?)),
            EventName::Typing => Ok(InboundEvent::Typing(from_value(name, envelope)?)),
            EventName::StopTyping => Ok(InboundEvent::StopTyping(from_value(name, envelope)?)),
            EventName::UpdateUnreadCount => {
                Ok(InboundEvent::UpdateUnreadCount(from_value(name, envelope)?))
            },
            EventName::JoinRoom | EventName::LeaveRoom | EventName::SendMessage => {
                Err(ProtocolError::UnexpectedDirection {
                    event: envelope.event.clone(),
                    direction: "inbound",
                })
            },
        }
    }
}

fn to_value<T: Serialize>(name: EventName, payload: &T) -> Result<serde_json::Value> {
    serde_json::to_value(payload).map_err(|e| ProtocolError::InvalidPayload {
        event: name.as_str().to_owned(),
        reason: e.to_string(),
    })
}

fn from_value<T: DeserializeOwned>(name: EventName, envelope: &Envelope) -> Result<T> {
    T::deserialize(&envelope.payload).map_err(|e| ProtocolError::InvalidPayload {
        event: name.as_str().to_owned(),
        reason: e.to_string(),
    })
}
