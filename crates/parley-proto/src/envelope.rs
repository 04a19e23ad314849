//! JSON envelope carried by the channel transport.
//!
//! The envelope keeps the event name separate from its payload so the
//! channel can route by name without parsing the payload, and so unknown
//! events can be logged and dropped instead of failing the whole stream.

use serde::{Deserialize, Serialize};

use crate::{
    EventName,
    errors::{ProtocolError, Result},
};

/// A named event on the wire: `{"event": "...", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Wire event name.
    pub event: String,
    /// Event payload. `null` if the event carries none.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Envelope for a known event name.
    pub fn new(name: EventName, payload: serde_json::Value) -> Self {
        Self { event: name.as_str().to_owned(), payload }
    }

    /// Known event name, or [`ProtocolError::UnknownEvent`].
    pub fn name(&self) -> Result<EventName> {
        self.event.parse()
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Parse a JSON text frame.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}
