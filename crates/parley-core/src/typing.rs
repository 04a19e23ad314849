//! Typing presence.
//!
//! [`TypingTracker`] reduces inbound `typing` / `stopTyping` signals for the
//! active conversation. [`Composer`] derives the outbound signals from the
//! local draft.
//!
//! There is no timeout. A participant stays typing until an explicit stop or
//! until the room is left; a dropped `stopTyping` leaves the indicator on for
//! the rest of the activation.

use std::collections::BTreeMap;

use parley_proto::{ConversationId, ParticipantId};

/// Typing state of one participant in one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    /// Conversation.
    pub conversation_id: ConversationId,
    /// Remote participant.
    pub participant_id: ParticipantId,
    /// Whether the participant is typing.
    pub is_typing: bool,
}

/// Inbound typing presence for the active conversation.
#[derive(Debug, Clone)]
pub struct TypingTracker {
    local: ParticipantId,
    conversation: Option<ConversationId>,
    typing: BTreeMap<ParticipantId, bool>,
}

impl TypingTracker {
    /// Tracker that ignores signals originated by `local`.
    pub fn new(local: ParticipantId) -> Self {
        Self { local, conversation: None, typing: BTreeMap::new() }
    }

    /// Bind to `conversation_id`, dropping any previous presence.
    pub fn bind(&mut self, conversation_id: ConversationId) {
        self.typing.clear();
        self.conversation = Some(conversation_id);
    }

    /// Conversation the tracker is bound to.
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// Participant started typing. Returns `true` if presence changed.
    pub fn typing_start(
        &mut self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
    ) -> bool {
        self.set(conversation_id, participant_id, true)
    }

    /// Participant stopped typing. Returns `true` if presence changed.
    pub fn typing_stop(
        &mut self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
    ) -> bool {
        self.set(conversation_id, participant_id, false)
    }

    /// Drop all presence and unbind.
    pub fn reset(&mut self) {
        self.typing.clear();
        self.conversation = None;
    }

    /// `true` if `participant_id` is typing.
    pub fn is_typing(&self, participant_id: &ParticipantId) -> bool {
        self.typing.get(participant_id).copied().unwrap_or(false)
    }

    /// `true` if any remote participant is typing.
    pub fn anyone_typing(&self) -> bool {
        self.typing.values().any(|typing| *typing)
    }

    /// Remote participants currently typing.
    pub fn typing_participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.typing.iter().filter(|(_, typing)| **typing).map(|(id, _)| id)
    }

    /// Snapshot of every tracked participant.
    pub fn states(&self) -> Vec<TypingState> {
        let Some(conversation_id) = &self.conversation else {
            return Vec::new();
        };
        self.typing
            .iter()
            .map(|(participant_id, is_typing)| TypingState {
                conversation_id: conversation_id.clone(),
                participant_id: participant_id.clone(),
                is_typing: *is_typing,
            })
            .collect()
    }

    fn set(
        &mut self,
        conversation_id: &ConversationId,
        participant_id: &ParticipantId,
        is_typing: bool,
    ) -> bool {
        if *participant_id == self.local || self.conversation.as_ref() != Some(conversation_id) {
            return false;
        }

        let previous = self.typing.insert(participant_id.clone(), is_typing);
        previous.unwrap_or(false) != is_typing
    }
}

/// Outbound typing signal derived from the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerSignal {
    /// Emit `typing`.
    Start,
    /// Emit `stopTyping`.
    Stop,
}

/// Tracks whether `typing` has been announced for the current draft.
#[derive(Debug, Clone, Copy, Default)]
pub struct Composer {
    announced: bool,
}

impl Composer {
    /// `true` if `typing` was emitted and no `stopTyping` followed yet.
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    /// Draft text changed.
    pub fn on_draft_changed(&mut self, draft: &str) -> Option<ComposerSignal> {
        match (self.announced, draft.is_empty()) {
            (false, false) => {
                self.announced = true;
                Some(ComposerSignal::Start)
            },
            (true, true) => {
                self.announced = false;
                Some(ComposerSignal::Stop)
            },
            _ => None,
        }
    }

    /// Draft was sent; the composer clears.
    pub fn on_sent(&mut self) -> Option<ComposerSignal> {
        self.on_draft_changed("")
    }

    /// Forget the announcement without emitting (room left).
    pub fn reset(&mut self) {
        self.announced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> TypingTracker {
        let mut tracker = TypingTracker::new("me".into());
        tracker.bind("c1".into());
        tracker
    }

    #[test]
    fn start_and_stop() {
        let mut tracker = tracker();
        let conversation = ConversationId::from("c1");

        assert!(tracker.typing_start(&conversation, &"bob".into()));
        assert!(!tracker.typing_start(&conversation, &"bob".into()));
        assert!(tracker.anyone_typing());

        assert!(tracker.typing_stop(&conversation, &"bob".into()));
        assert!(!tracker.anyone_typing());
    }

    #[test]
    fn self_signals_ignored() {
        let mut tracker = tracker();

        assert!(!tracker.typing_start(&"c1".into(), &"me".into()));
        assert!(!tracker.is_typing(&"me".into()));
        assert!(tracker.states().is_empty());
    }

    #[test]
    fn other_conversation_ignored() {
        let mut tracker = tracker();

        assert!(!tracker.typing_start(&"c2".into(), &"bob".into()));
        assert!(!tracker.anyone_typing());
    }

    #[test]
    fn no_timeout_until_reset() {
        let mut tracker = tracker();
        tracker.typing_start(&"c1".into(), &"bob".into());

        assert_eq!(tracker.typing_participants().count(), 1);

        tracker.reset();
        assert!(!tracker.anyone_typing());
        assert!(tracker.conversation().is_none());
    }

    #[test]
    fn composer_emits_on_transitions_only() {
        let mut composer = Composer::default();

        assert_eq!(composer.on_draft_changed("h"), Some(ComposerSignal::Start));
        assert_eq!(composer.on_draft_changed("he"), None);
        assert_eq!(composer.on_draft_changed(""), Some(ComposerSignal::Stop));
        assert_eq!(composer.on_draft_changed(""), None);
    }

    #[test]
    fn composer_stops_on_send() {
        let mut composer = Composer::default();
        composer.on_draft_changed("hey");

        assert_eq!(composer.on_sent(), Some(ComposerSignal::Stop));
        assert_eq!(composer.on_sent(), None);
    }
}
