//! Per-conversation unread counts.
//!
//! The ledger is the single source of truth for unread counts; the
//! conversation list only reads it. Counts arrive from the server as absolute
//! values and are applied last-write-wins. Counts carry no sequence number, so
//! an out-of-order delivery can regress a count until the next update.

use std::collections::HashMap;

use parley_proto::{Conversation, ConversationId};

/// Server acknowledgement state of the last mark-read for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAck {
    /// Zeroed locally; acknowledgement in flight.
    Pending,
    /// Server accepted the acknowledgement.
    Acknowledged,
    /// Acknowledgement failed. The local zero is kept.
    Failed,
}

/// Unread counts keyed by conversation.
#[derive(Debug, Clone, Default)]
pub struct UnreadLedger {
    counts: HashMap<ConversationId, u32>,
    acks: HashMap<ConversationId, ReadAck>,
}

impl UnreadLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed counts from a freshly fetched roster.
    pub fn seed_from_roster<'a>(&mut self, roster: impl IntoIterator<Item = &'a Conversation>) {
        for conversation in roster {
            self.counts.insert(conversation.id.clone(), conversation.unread_count);
        }
    }

    /// Apply a server count. Returns `true` if the stored value changed.
    pub fn apply_count(&mut self, conversation_id: ConversationId, count: u32) -> bool {
        let previous = self.counts.insert(conversation_id, count);
        previous != Some(count)
    }

    /// Zero the count locally ahead of the server acknowledgement. Returns the
    /// previous count.
    pub fn mark_read(&mut self, conversation_id: &ConversationId) -> u32 {
        self.acks.insert(conversation_id.clone(), ReadAck::Pending);
        self.counts.insert(conversation_id.clone(), 0).unwrap_or(0)
    }

    /// Record the acknowledgement outcome. Never restores the previous count.
    pub fn acknowledge(&mut self, conversation_id: &ConversationId, ok: bool) {
        let ack = if ok { ReadAck::Acknowledged } else { ReadAck::Failed };
        self.acks.insert(conversation_id.clone(), ack);
    }

    /// Acknowledgement state of the last mark-read, if any.
    pub fn read_ack(&self, conversation_id: &ConversationId) -> Option<ReadAck> {
        self.acks.get(conversation_id).copied()
    }

    /// Unread count. Unknown conversations count zero.
    pub fn count(&self, conversation_id: &ConversationId) -> u32 {
        self.counts.get(conversation_id).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u32 {
        self.counts.values().fold(0u32, |sum, count| sum.saturating_add(*count))
    }

    /// Number of conversations with an entry.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` if no conversation has an entry.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
