//! Message timeline for the active conversation.
//!
//! The timeline merges two streams into one ordered list: messages the local
//! user authored (shown immediately, before any server round-trip) and
//! messages the server delivers (history seed and live events, including the
//! echo of the local user's own messages).
//!
//! # Ordering
//!
//! Entries are kept in arrival/append order and are never re-sorted by
//! timestamp. Timestamps come from each author's clock and are not comparable
//! across clients. Replacements happen in place, so an echo never moves its
//! optimistic entry. The exception is a repeated local send under the default
//! policy, described below.
//!
//! # Reconciliation
//!
//! Under [`MergePolicy::TextAndSender`] (the default) an incoming message that
//! has the same `(text, sender_id)` as an existing entry replaces it in place,
//! taking over the server's id and timestamp. Two distinct messages with
//! identical text from the same sender therefore collapse into one entry.
//!
//! A local append with the same key as an existing entry removes that entry
//! and appends at the end, even when the existing entry is a confirmed
//! history message. This is the one exception to arrival order: the repeated
//! text moves to the position of the newest send. Under
//! [`MergePolicy::Correlated`] nothing is removed and order always holds.
//!
//! [`MergePolicy::Correlated`] matches on the `client_id` correlation field
//! when the server echoes it. Messages without a `client_id` only reconcile
//! against still-pending local entries, so repeated texts stay distinct.

use parley_proto::{ConversationId, Message, MessageId, ParticipantId};

use crate::{env::Environment, error::TimelineError};

/// How incoming messages are matched against existing entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Match on `(text, sender_id)`. No two entries ever share that pair.
    #[default]
    TextAndSender,
    /// Match on the echoed `client_id`, falling back to `(text, sender_id)`
    /// against pending entries when the echo lacks one.
    Correlated,
}

/// Server confirmation state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Authored locally; no server copy seen yet.
    Pending,
    /// Server copy merged (or loaded from history).
    Confirmed,
}

/// A timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Message as currently known.
    pub message: Message,
    /// Confirmation state.
    pub delivery: Delivery,
}

/// Result of [`Timeline::merge_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No match; appended at `index`.
    Appended {
        /// Position of the new entry.
        index: usize,
    },
    /// Replaced the matching entry at `index`.
    Replaced {
        /// Position of the replaced entry.
        index: usize,
    },
    /// Message belongs to another conversation (or the timeline is unseeded)
    /// and was dropped.
    Ignored,
}

/// Ordered, deduplicated messages for one conversation.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    conversation: Option<ConversationId>,
    entries: Vec<TimelineEntry>,
    policy: MergePolicy,
}

impl Timeline {
    /// Empty, unseeded timeline.
    pub fn new(policy: MergePolicy) -> Self {
        Self { conversation: None, entries: Vec::new(), policy }
    }

    /// Merge policy in effect.
    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Conversation the timeline is seeded for. `None` if unseeded.
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Messages in display order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of optimistic entries still awaiting their server copy.
    pub fn pending_len(&self) -> usize {
        self.entries.iter().filter(|e| e.delivery == Delivery::Pending).count()
    }

    /// Replace all content with `history` for `conversation_id`.
    ///
    /// Messages for other conversations are dropped. History passes through
    /// the same matching rules as live messages, so the dedup invariant holds
    /// from the first entry.
    pub fn seed(&mut self, conversation_id: ConversationId, history: Vec<Message>) {
        self.entries.clear();
        self.conversation = Some(conversation_id);
        for message in history {
            let _ = self.merge_remote(message);
        }
    }

    /// Append an optimistic entry authored by `sender_id`.
    ///
    /// Under [`MergePolicy::TextAndSender`] an existing entry with the same
    /// `(text, sender_id)` is removed first, confirmed or not (see the module
    /// docs on ordering). The synthesized message gets a client-generated id,
    /// which doubles as its correlation `client_id`, and the current
    /// wall-clock time. It is returned so the caller can transmit it.
    ///
    /// # Errors
    ///
    /// - `TimelineError::Unseeded` if no conversation is active
    /// - `TimelineError::EmptyText` if `text` is blank
    pub fn append_local<E: Environment>(
        &mut self,
        env: &E,
        text: String,
        sender_id: ParticipantId,
    ) -> Result<Message, TimelineError> {
        let conversation_id = self.conversation.clone().ok_or(TimelineError::Unseeded)?;
        if text.trim().is_empty() {
            return Err(TimelineError::EmptyText);
        }

        let id = MessageId::new(format!("local-{:016x}", env.random_u64()));
        let message = Message {
            id: id.clone(),
            conversation_id,
            sender_id,
            text,
            sent_at: env.unix_millis(),
            client_id: Some(id),
        };

        if self.policy == MergePolicy::TextAndSender {
            self.entries.retain(|e| !e.message.same_text_and_sender(&message));
        }
        self.entries.push(TimelineEntry { message: message.clone(), delivery: Delivery::Pending });
        Ok(message)
    }

    /// Merge a server-delivered message.
    pub fn merge_remote(&mut self, mut incoming: Message) -> MergeOutcome {
        if self.conversation.as_ref() != Some(&incoming.conversation_id) {
            return MergeOutcome::Ignored;
        }

        let Some(index) = self.find_match(&incoming) else {
            self.entries.push(TimelineEntry { message: incoming, delivery: Delivery::Confirmed });
            return MergeOutcome::Appended { index: self.entries.len() - 1 };
        };

        let entry = &mut self.entries[index];
        if incoming.client_id.is_none() {
            incoming.client_id = entry.message.client_id.take();
        }
        *entry = TimelineEntry { message: incoming, delivery: Delivery::Confirmed };
        MergeOutcome::Replaced { index }
    }

    /// Drop all entries and forget the conversation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.conversation = None;
    }

    fn find_match(&self, incoming: &Message) -> Option<usize> {
        match self.policy {
            MergePolicy::TextAndSender => {
                self.entries.iter().position(|e| e.message.same_text_and_sender(incoming))
            },
            MergePolicy::Correlated => match &incoming.client_id {
                Some(client_id) => self
                    .entries
                    .iter()
                    .position(|e| e.message.client_id.as_ref() == Some(client_id)),
                None => self.entries.iter().position(|e| {
                    e.delivery == Delivery::Pending && e.message.same_text_and_sender(incoming)
                }),
            },
        }
    }
}
