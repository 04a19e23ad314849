//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Envelope names an event this protocol does not know.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Known event received in the wrong direction (e.g. `joinRoom` from the
    /// server).
    #[error("event {event} is not valid {direction}")]
    UnexpectedDirection {
        /// Event name as it appeared on the wire
        event: String,
        /// Direction the decoder expected ("inbound" or "outbound")
        direction: &'static str,
    },

    /// Payload did not match the schema for its event.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload {
        /// Event whose payload failed to parse
        event: String,
        /// Parser message
        reason: String,
    },

    /// Envelope itself was not valid JSON or lacked the `event` field.
    #[error("malformed envelope: {0}")]
    Malformed(String),
}
