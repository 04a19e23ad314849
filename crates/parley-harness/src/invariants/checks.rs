//! Standard invariant checks.

use parley_core::{MergePolicy, RoomState, Scope};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// No two timeline entries share `(text, sender_id)` under the default
/// merge policy.
pub struct TimelineDedup;

impl Invariant for TimelineDedup {
    fn name(&self) -> &'static str {
        "timeline_dedup"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.merge_policy != MergePolicy::TextAndSender {
            return Ok(());
        }
        for (i, a) in state.timeline.iter().enumerate() {
            if let Some(b) =
                state.timeline[i + 1..].iter().find(|b| b.message.same_text_and_sender(&a.message))
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: {:?} from {} appears as {} and {}",
                        state.participant, a.message.text, a.message.sender_id, a.message.id,
                        b.message.id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Timeline entries all belong to the active room; no room means no entries.
pub struct RoomIsolation;

impl Invariant for RoomIsolation {
    fn name(&self) -> &'static str {
        "room_isolation"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let active = state.active_conversation();
        match state.timeline.iter().find(|e| Some(&e.message.conversation_id) != active) {
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{}: message {} of {} shown while active room is {:?}",
                    state.participant, stray.message.id, stray.message.conversation_id, active
                ),
            }),
            None => Ok(()),
        }
    }
}

/// The local participant never appears as typing.
pub struct TypingSelfExclusion;

impl Invariant for TypingSelfExclusion {
    fn name(&self) -> &'static str {
        "typing_self_exclusion"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.typing.contains(&state.participant) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} shown typing to themself", state.participant),
            });
        }
        if state.active_conversation().is_none() && !state.typing.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{}: typing shown with no active room", state.participant),
            });
        }
        Ok(())
    }
}

/// Room-scoped handlers exist only for the joined activation.
pub struct RoomScopedHandlers;

impl Invariant for RoomScopedHandlers {
    fn name(&self) -> &'static str {
        "room_scoped_handlers"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(scopes) = &state.handler_scopes else {
            return Ok(());
        };
        let allowed = match &state.room {
            RoomState::Joined { activation, .. } => Some(Scope::Activation(*activation)),
            RoomState::Idle | RoomState::Joining { .. } | RoomState::Leaving { .. } => None,
        };

        match scopes.iter().find(|s| **s != Scope::Session && Some(**s) != allowed) {
            Some(stray) => Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{}: handlers under {:?} while room is {:?}",
                    state.participant, stray, state.room
                ),
            }),
            None => Ok(()),
        }
    }
}

/// At most one conversation row is active, and it is the active room.
pub struct ActiveRowMatchesRoom;

impl Invariant for ActiveRowMatchesRoom {
    fn name(&self) -> &'static str {
        "active_row_matches_room"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let active = state.active_conversation();
        for row in state.conversations.rows.iter().filter(|r| r.is_active) {
            if Some(&row.conversation_id) != active {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: row {} highlighted while active room is {:?}",
                        state.participant, row.conversation_id, active
                    ),
                });
            }
        }
        Ok(())
    }
}
