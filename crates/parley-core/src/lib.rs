//! Parley synchronization core.
//!
//! Pure state machines for the pieces of a chat client that must stay
//! consistent while live events, history fetches and user actions interleave.
//! Nothing in this crate performs I/O: methods take inputs (including time and
//! randomness through [`env::Environment`]) and return data or actions for the
//! caller to execute.
//!
//! # Components
//!
//! - [`Channel`]: connection state and named-event subscription registry
//! - [`RoomTracker`]: `Idle → Joining → Joined → Leaving → Idle` lifecycle
//! - [`Timeline`]: ordered, deduplicated messages of the active conversation
//! - [`TypingTracker`] / [`Composer`]: inbound and outbound typing presence
//! - [`UnreadLedger`]: per-conversation unread counts
//! - [`ConversationListProjector`]: list view model over ledger and roster

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod env;
pub mod error;
pub mod ledger;
pub mod projector;
pub mod room;
pub mod timeline;
pub mod typing;

pub use channel::{Channel, ChannelAction, ChannelState, Scope, SubscriptionId};
pub use error::{ChannelError, RoomError, TimelineError};
pub use ledger::{ReadAck, UnreadLedger};
pub use projector::{
    ConversationList, ConversationListProjector, ConversationRow, DEFAULT_EMPTY_PREVIEW,
};
pub use room::{ActivationId, Departure, RoomState, RoomTracker};
pub use timeline::{Delivery, MergeOutcome, MergePolicy, Timeline, TimelineEntry};
pub use typing::{Composer, ComposerSignal, TypingState, TypingTracker};
