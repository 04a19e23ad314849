//! Opaque string identifiers.
//!
//! Conversations, participants and messages are identified by strings assigned
//! outside the core (server, auth provider, or the authoring client). The
//! newtypes keep them from being mixed up at call sites.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a two-participant conversation ("room").
    ConversationId
);

string_id!(
    /// Identifier of a participant, as issued by the session collaborator.
    ParticipantId
);

string_id!(
    /// Message identifier. Server-assigned for confirmed messages,
    /// client-generated for optimistic ones.
    MessageId
);
