//! Connection channel state machine.
//!
//! One [`Channel`] exists per client session. It is created once when the
//! session starts and injected into everything that needs it; recreating it
//! mid-session would duplicate the connection and every registered handler.
//!
//! The channel does not own a socket. It tracks connection state, turns typed
//! events into [`ChannelAction`]s for the driver, and keeps the registry of
//! handlers subscribed to each event name.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐ connected ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────>│ Connected │
//! └──────────────┘         └────────────┘           └───────────┘
//!        ^                       │ disconnected           │
//!        └───────────────────────┴────────────────────────┘
//!
//!            close (any state) ──> Closed (terminal)
//! ```
//!
//! # Subscriptions
//!
//! Handlers are registered per [`EventName`] under a [`Scope`]. Dispatch
//! yields them in subscription order. Room activations register under their
//! own scope so that leaving a room removes every handler it added in one
//! call, on every exit path.

use std::collections::BTreeMap;

use parley_proto::{Envelope, EventName, OutboundEvent, ParticipantId};

use crate::{error::ChannelError, room::ActivationId};

/// Connection state, observable by callers so failures can be surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    /// No connection. `reason` is set when a connection attempt failed or an
    /// established connection dropped.
    Disconnected {
        /// Why the connection is down. `None` before the first attempt.
        reason: Option<String>,
    },
    /// Handshake in progress.
    Connecting,
    /// Handshake complete; events may be emitted.
    Connected,
    /// Session ended. Terminal.
    Closed,
}

/// Actions for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    /// Open the transport and perform the handshake for this identity.
    Open {
        /// Session identity presented during the handshake.
        identity: ParticipantId,
    },
    /// Send an envelope.
    Send(Envelope),
    /// Close the transport.
    Close,
}

/// Lifetime a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Lives for the whole session (conversation-list events).
    Session,
    /// Lives for one room activation.
    Activation(ActivationId),
}

/// Handle returned by [`Channel::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone)]
struct Subscription<H> {
    id: SubscriptionId,
    scope: Scope,
    handler: H,
}

/// Session-scoped connection channel.
///
/// Generic over the handler type `H` so the owner decides what a handler is
/// (a closure, or a routing value interpreted by a state machine).
#[derive(Debug, Clone)]
pub struct Channel<H> {
    identity: ParticipantId,
    state: ChannelState,
    next_subscription: u64,
    handlers: BTreeMap<EventName, Vec<Subscription<H>>>,
}

impl<H> Channel<H> {
    /// Create a disconnected channel for `identity`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::AnonymousIdentity` if `identity` is empty
    pub fn new(identity: ParticipantId) -> Result<Self, ChannelError> {
        if identity.is_empty() {
            return Err(ChannelError::AnonymousIdentity);
        }

        Ok(Self {
            identity,
            state: ChannelState::Disconnected { reason: None },
            next_subscription: 0,
            handlers: BTreeMap::new(),
        })
    }

    /// Session identity.
    pub fn identity(&self) -> &ParticipantId {
        &self.identity
    }

    /// Current connection state.
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// `true` if events may be emitted.
    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Connected
    }

    /// Start the handshake.
    ///
    /// Returns no actions if a connection is already established or in
    /// progress.
    ///
    /// # Errors
    ///
    /// - `ChannelError::Closed` if the session has ended
    pub fn connect(&mut self) -> Result<Vec<ChannelAction>, ChannelError> {
        match self.state {
            ChannelState::Closed => Err(ChannelError::Closed),
            ChannelState::Connecting | ChannelState::Connected => Ok(Vec::new()),
            ChannelState::Disconnected { .. } => {
                self.state = ChannelState::Connecting;
                Ok(vec![ChannelAction::Open { identity: self.identity.clone() }])
            },
        }
    }

    /// Transport reports the handshake completed.
    ///
    /// Returns `true` if this changed the state.
    pub fn on_connected(&mut self) -> bool {
        match self.state {
            ChannelState::Closed | ChannelState::Connected => false,
            ChannelState::Disconnected { .. } | ChannelState::Connecting => {
                self.state = ChannelState::Connected;
                true
            },
        }
    }

    /// Transport reports the connection failed or dropped.
    ///
    /// Subscriptions survive a disconnect; they are bound to the session, not
    /// to one transport connection.
    pub fn on_disconnected(&mut self, reason: impl Into<String>) {
        if self.state != ChannelState::Closed {
            self.state = ChannelState::Disconnected { reason: Some(reason.into()) };
        }
    }

    /// Encode an event for sending.
    ///
    /// # Errors
    ///
    /// - `ChannelError::NotConnected` if the handshake has not completed
    /// - `ChannelError::Closed` if the session has ended
    /// - `ChannelError::Protocol` if the event cannot be encoded
    pub fn emit(&self, event: &OutboundEvent) -> Result<ChannelAction, ChannelError> {
        match &self.state {
            ChannelState::Connected => Ok(ChannelAction::Send(event.to_envelope()?)),
            ChannelState::Closed => Err(ChannelError::Closed),
            state => Err(ChannelError::NotConnected { state: state.clone() }),
        }
    }

    /// Register `handler` for `name` under `scope`.
    pub fn subscribe(&mut self, name: EventName, scope: Scope, handler: H) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.handlers.entry(name).or_default().push(Subscription { id, scope, handler });
        id
    }

    /// Remove one subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for subs in self.handlers.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.id != id);
            removed |= subs.len() != before;
        }
        self.handlers.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Remove every subscription registered under `scope`. Returns how many
    /// were removed.
    pub fn unsubscribe_scope(&mut self, scope: Scope) -> usize {
        let mut removed = 0;
        for subs in self.handlers.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.scope != scope);
            removed += before - subs.len();
        }
        self.handlers.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Handlers for `name`, in subscription order.
    pub fn handlers(&self, name: EventName) -> impl Iterator<Item = &H> {
        self.handlers.get(&name).into_iter().flatten().map(|s| &s.handler)
    }

    /// Number of handlers registered under `scope`.
    pub fn scope_len(&self, scope: Scope) -> usize {
        self.handlers.values().flatten().filter(|s| s.scope == scope).count()
    }

    /// Scopes that currently hold at least one handler.
    pub fn active_scopes(&self) -> Vec<Scope> {
        let mut scopes: Vec<Scope> = self.handlers.values().flatten().map(|s| s.scope).collect();
        scopes.sort_unstable();
        scopes.dedup();
        scopes
    }

    /// End the session. Drops every handler.
    pub fn close(&mut self) -> Vec<ChannelAction> {
        if self.state == ChannelState::Closed {
            return Vec::new();
        }
        self.state = ChannelState::Closed;
        self.handlers.clear();
        vec![ChannelAction::Close]
    }
}
