//! Room membership state machine.
//!
//! Binds the session channel to at most one conversation at a time.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ begin_join ┌─────────┐ mark_seeded + complete_join ┌────────┐
//! │ Idle │───────────>│ Joining │────────────────────────────>│ Joined │
//! └──────┘            └─────────┘                             └────────┘
//!    ^                     │ begin_leave                          │ begin_leave
//!    │                     v                                      │
//!    │   complete_leave ┌─────────┐<────────────────────────────────┘
//!    └──────────────────│ Leaving │
//!                       └─────────┘
//! ```
//!
//! # Invariants
//!
//! - A join is never ready before the activation's history seed is applied.
//!   Live events that arrive ahead of the historical merge would otherwise be
//!   dropped or duplicated.
//! - Every activation gets a fresh [`ActivationId`]. Results tagged with an
//!   older id are rejected, so a slow history fetch for a room the user already
//!   left cannot seed the current room.

use parley_proto::ConversationId;

use crate::error::RoomError;

/// Monotonically increasing identifier of one room activation.
pub type ActivationId = u64;

/// Room membership state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomState {
    /// No active conversation.
    Idle,
    /// Activation started; waiting for the history seed and/or connectivity.
    Joining {
        /// Conversation being joined.
        conversation_id: ConversationId,
        /// Activation this join belongs to.
        activation: ActivationId,
        /// History seed applied to the timeline.
        seeded: bool,
    },
    /// `joinRoom` emitted; room-scoped handlers are live.
    Joined {
        /// Joined conversation.
        conversation_id: ConversationId,
        /// Current activation.
        activation: ActivationId,
    },
    /// Teardown in progress.
    Leaving {
        /// Conversation being left.
        conversation_id: ConversationId,
        /// Activation being torn down.
        activation: ActivationId,
    },
}

impl RoomState {
    fn name(&self) -> &'static str {
        match self {
            RoomState::Idle => "idle",
            RoomState::Joining { .. } => "joining",
            RoomState::Joined { .. } => "joined",
            RoomState::Leaving { .. } => "leaving",
        }
    }
}

/// Outcome of [`RoomTracker::begin_leave`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Conversation being left.
    pub conversation_id: ConversationId,
    /// Activation being torn down.
    pub activation: ActivationId,
    /// `joinRoom` had been emitted, so a `leaveRoom` is owed to the server.
    pub was_joined: bool,
}

/// Room membership tracker.
#[derive(Debug, Clone)]
pub struct RoomTracker {
    state: RoomState,
    next_activation: ActivationId,
}

impl Default for RoomTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self { state: RoomState::Idle, next_activation: 1 }
    }

    /// Current state.
    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Conversation currently joining, joined or leaving. `None` if idle.
    pub fn conversation(&self) -> Option<&ConversationId> {
        match &self.state {
            RoomState::Idle => None,
            RoomState::Joining { conversation_id, .. }
            | RoomState::Joined { conversation_id, .. }
            | RoomState::Leaving { conversation_id, .. } => Some(conversation_id),
        }
    }

    /// Current activation id. `None` if idle.
    pub fn activation(&self) -> Option<ActivationId> {
        match &self.state {
            RoomState::Idle => None,
            RoomState::Joining { activation, .. }
            | RoomState::Joined { activation, .. }
            | RoomState::Leaving { activation, .. } => Some(*activation),
        }
    }

    /// `true` if `joinRoom` has been emitted for the current activation.
    pub fn is_joined(&self) -> bool {
        matches!(self.state, RoomState::Joined { .. })
    }

    /// Start activating `conversation_id`.
    ///
    /// # Errors
    ///
    /// - `RoomError::InvalidTransition` unless idle; callers leave the
    ///   previous room first
    pub fn begin_join(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<ActivationId, RoomError> {
        if self.state != RoomState::Idle {
            return Err(self.invalid("begin_join"));
        }

        let activation = self.next_activation;
        self.next_activation += 1;
        self.state = RoomState::Joining { conversation_id, activation, seeded: false };
        Ok(activation)
    }

    /// Record that the history seed for `activation` was applied.
    ///
    /// # Errors
    ///
    /// - `RoomError::StaleActivation` if `activation` is not the one joining
    pub fn mark_seeded(&mut self, activation: ActivationId) -> Result<(), RoomError> {
        let current = self.activation();
        match &mut self.state {
            RoomState::Joining { seeded, .. } if current == Some(activation) => {
                *seeded = true;
                Ok(())
            },
            _ => Err(RoomError::StaleActivation { got: activation, current }),
        }
    }

    /// Conversation and activation whose `joinRoom` may be emitted now.
    /// `None` unless joining with the seed applied.
    pub fn ready_to_join(&self) -> Option<(&ConversationId, ActivationId)> {
        match &self.state {
            RoomState::Joining { conversation_id, activation, seeded: true } => {
                Some((conversation_id, *activation))
            },
            _ => None,
        }
    }

    /// Record that `joinRoom` was emitted.
    ///
    /// # Errors
    ///
    /// - `RoomError::InvalidTransition` unless joining with the seed applied
    pub fn complete_join(&mut self) -> Result<(), RoomError> {
        let RoomState::Joining { conversation_id, activation, seeded: true } = &self.state else {
            return Err(self.invalid("complete_join"));
        };

        let (conversation_id, activation) = (conversation_id.clone(), *activation);
        self.state = RoomState::Joined { conversation_id, activation };
        Ok(())
    }

    /// Start leaving. `None` if idle.
    pub fn begin_leave(&mut self) -> Option<Departure> {
        let (conversation_id, activation, was_joined) = match &self.state {
            RoomState::Idle | RoomState::Leaving { .. } => return None,
            RoomState::Joining { conversation_id, activation, .. } => {
                (conversation_id.clone(), *activation, false)
            },
            RoomState::Joined { conversation_id, activation } => {
                (conversation_id.clone(), *activation, true)
            },
        };

        self.state =
            RoomState::Leaving { conversation_id: conversation_id.clone(), activation };
        Some(Departure { conversation_id, activation, was_joined })
    }

    /// Finish leaving.
    ///
    /// # Errors
    ///
    /// - `RoomError::InvalidTransition` unless leaving
    pub fn complete_leave(&mut self) -> Result<(), RoomError> {
        if !matches!(self.state, RoomState::Leaving { .. }) {
            return Err(self.invalid("complete_leave"));
        }
        self.state = RoomState::Idle;
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> RoomError {
        RoomError::InvalidTransition { state: self.state.name(), operation }
    }
}
