//! Conversation list view model.
//!
//! Pure projection over the roster, the last-message cache and the
//! [`UnreadLedger`]. Recomputed whenever any of them changes.

use std::collections::HashMap;

use parley_proto::{Conversation, ConversationId, Message};

use crate::ledger::UnreadLedger;

/// Preview shown for a conversation with no known message.
pub const DEFAULT_EMPTY_PREVIEW: &str = "No messages yet";

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRow {
    /// Conversation.
    pub conversation_id: ConversationId,
    /// Other participant's display name.
    pub display_name: String,
    /// Other participant's avatar.
    pub avatar_url: Option<String>,
    /// Fallback initial when no avatar is set.
    pub avatar_initial: Option<char>,
    /// Latest message text, or the empty preview.
    pub last_message: String,
    /// Unread count from the ledger.
    pub unread_count: u32,
    /// Conversation is the active room.
    pub is_active: bool,
}

/// Projected conversation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationList {
    /// Rows in roster order.
    pub rows: Vec<ConversationRow>,
    /// Sum of unread counts across all known conversations.
    pub total_unread: u32,
}

/// Builds [`ConversationList`]s.
#[derive(Debug, Clone)]
pub struct ConversationListProjector {
    roster: Vec<Conversation>,
    last_messages: HashMap<ConversationId, String>,
    empty_preview: String,
}

impl Default for ConversationListProjector {
    fn default() -> Self {
        Self::new(DEFAULT_EMPTY_PREVIEW)
    }
}

impl ConversationListProjector {
    /// Projector showing `empty_preview` for conversations with no message.
    pub fn new(empty_preview: impl Into<String>) -> Self {
        Self { roster: Vec::new(), last_messages: HashMap::new(), empty_preview: empty_preview.into() }
    }

    /// Replace the roster. Seeds the last-message cache from roster previews
    /// without overwriting messages seen live.
    pub fn set_roster(&mut self, roster: Vec<Conversation>) {
        for conversation in &roster {
            if let Some(preview) = &conversation.last_message_preview {
                self.last_messages
                    .entry(conversation.id.clone())
                    .or_insert_with(|| preview.clone());
            }
        }
        self.roster = roster;
    }

    /// Current roster.
    pub fn roster(&self) -> &[Conversation] {
        &self.roster
    }

    /// Record the latest message of its conversation.
    pub fn record_message(&mut self, message: &Message) {
        self.last_messages.insert(message.conversation_id.clone(), message.text.clone());
    }

    /// Cached latest message text.
    pub fn last_message(&self, conversation_id: &ConversationId) -> Option<&str> {
        self.last_messages.get(conversation_id).map(String::as_str)
    }

    /// Compute the list.
    pub fn project(
        &self,
        ledger: &UnreadLedger,
        active: Option<&ConversationId>,
    ) -> ConversationList {
        let rows = self
            .roster
            .iter()
            .map(|conversation| ConversationRow {
                conversation_id: conversation.id.clone(),
                display_name: conversation.other_participant.display_name.clone(),
                avatar_url: conversation.other_participant.avatar_url.clone(),
                avatar_initial: conversation.other_participant.initial(),
                last_message: self
                    .last_message(&conversation.id)
                    .unwrap_or(&self.empty_preview)
                    .to_owned(),
                unread_count: ledger.count(&conversation.id),
                is_active: active == Some(&conversation.id),
            })
            .collect();

        ConversationList { rows, total_unread: ledger.total() }
    }
}
