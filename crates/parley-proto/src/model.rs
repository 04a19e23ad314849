//! Shared data model.

use serde::{Deserialize, Serialize};

use crate::{ConversationId, MessageId, ParticipantId};

/// A chat message.
///
/// Locally authored messages carry a client-generated `id` that differs from
/// the id the server later assigns to the same logical message, so `id` is
/// not usable for reconciliation. `client_id` is the correlation identifier
/// the authoring client attaches to `sendMessage`; servers that echo it back
/// allow exact reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier (server-assigned or client-generated).
    pub id: MessageId,
    /// Conversation the message belongs to.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: ParticipantId,
    /// Message body.
    pub text: String,
    /// Send time in Unix milliseconds, according to the author's clock.
    pub sent_at: u64,
    /// Correlation id attached by the authoring client. `None` if the server
    /// did not echo it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<MessageId>,
}

impl Message {
    /// `true` if `other` has the same `(text, sender_id)` identity.
    pub fn same_text_and_sender(&self, other: &Message) -> bool {
        self.text == other.text && self.sender_id == other.sender_id
    }
}

/// The participant on the other side of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Name shown in the conversation list.
    pub display_name: String,
    /// Avatar image URL. `None` if the participant has no avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Participant {
    /// Single-character fallback shown when no avatar is available.
    pub fn initial(&self) -> Option<char> {
        self.display_name.chars().next()
    }
}

/// Conversation roster entry as returned by the history collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Both participants. Exactly two for a valid conversation.
    pub participant_ids: Vec<ParticipantId>,
    /// The participant that is not the local user.
    pub other_participant: Participant,
    /// Preview of the latest message. `None` if the conversation is empty.
    #[serde(default)]
    pub last_message_preview: Option<String>,
    /// Unread count at fetch time.
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// `true` if the conversation has exactly two participants and `local` is
    /// one of them.
    pub fn is_valid_for(&self, local: &ParticipantId) -> bool {
        self.participant_ids.len() == 2 && self.participant_ids.contains(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(participants: &[&str]) -> Conversation {
        Conversation {
            id: ConversationId::new("c1"),
            participant_ids: participants.iter().map(|p| ParticipantId::from(*p)).collect(),
            other_participant: Participant {
                id: ParticipantId::new("b"),
                display_name: "Bea".into(),
                avatar_url: None,
            },
            last_message_preview: None,
            unread_count: 0,
        }
    }

    #[test]
    fn message_uses_camel_case_fields() {
        let json = r#"{"id":"m1","conversationId":"c1","senderId":"a","text":"hi","sentAt":5}"#;
        let message: Message = serde_json::from_str(json).unwrap();

        assert_eq!(message.conversation_id.as_str(), "c1");
        assert_eq!(message.sent_at, 5);
        assert!(message.client_id.is_none());
    }

    #[test]
    fn conversation_requires_two_participants_including_local() {
        let local = ParticipantId::new("a");

        assert!(conversation(&["a", "b"]).is_valid_for(&local));
        assert!(!conversation(&["b", "c"]).is_valid_for(&local));
        assert!(!conversation(&["a"]).is_valid_for(&local));
        assert!(!conversation(&["a", "b", "c"]).is_valid_for(&local));
    }

    #[test]
    fn participant_initial() {
        let p = Participant { id: "x".into(), display_name: "Zoe".into(), avatar_url: None };
        assert_eq!(p.initial(), Some('Z'));
    }
}
