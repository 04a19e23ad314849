//! Parley wire protocol.
//!
//! Typed named events exchanged over the duplex chat channel, the JSON
//! envelope that carries them, and the data model shared by every layer
//! (messages, conversations, identifiers).
//!
//! # Components
//!
//! - [`Envelope`]: `{"event": name, "payload": ...}` frame as sent on the wire
//! - [`EventName`]: closed set of event names understood by the protocol
//! - [`OutboundEvent`] / [`InboundEvent`]: typed events per direction
//! - [`Message`], [`Conversation`]: data model

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
pub mod errors;
mod events;
mod ids;
mod model;

pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
pub use events::{
    EventName, InboundEvent, OutboundEvent, SendMessagePayload, TypingPayload,
    UnreadCountPayload,
};
pub use ids::{ConversationId, MessageId, ParticipantId};
pub use model::{Conversation, Message, Participant};
