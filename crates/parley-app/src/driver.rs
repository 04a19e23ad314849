//! Driver trait for abstracting the channel transport.
//!
//! The [`Driver`] trait decouples the runtime from a specific duplex
//! transport. Production wraps a socket connection; simulation wraps an
//! in-process relay. The generic [`crate::Runtime`] handles all orchestration.
//!
//! Opening a connection is split in two. [`Driver::connect`] returns a
//! detached [`Handshake`] the runtime polls on its own task, and
//! [`Driver::attach`] installs the finished connection back on the loop. A
//! handshake that never completes therefore cannot stall screen commands.

use std::{future::Future, pin::Pin};

use parley_proto::{Envelope, ParticipantId};

/// Handshake in flight, detached from the driver it was started on.
pub type Handshake<C, E> = Pin<Box<dyn Future<Output = Result<C, E>> + Send + 'static>>;

/// Abstracts the duplex, event-based connection.
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Transport-specific error type
/// - [`Connection`](Driver::Connection): Established connection produced by a
///   handshake
pub trait Driver: Send {
    /// Transport-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Established connection, handed to [`Driver::attach`].
    type Connection: Send + 'static;

    /// Start the handshake for `identity`.
    ///
    /// The returned future must not borrow the driver. It resolves to an
    /// error if the connection cannot be established or the handshake is
    /// refused.
    fn connect(&self, identity: &ParticipantId) -> Handshake<Self::Connection, Self::Error>;

    /// Install a connection produced by a completed handshake, replacing any
    /// previous one.
    fn attach(&mut self, connection: Self::Connection);

    /// Send an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the send fails.
    fn send(&mut self, envelope: Envelope) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next envelope.
    ///
    /// Returns `None` if the connection closed. Must be cancel-safe: the
    /// runtime polls it inside `select!`.
    fn recv(&mut self) -> impl Future<Output = Option<Envelope>> + Send;

    /// Check if the connection is open.
    fn is_connected(&self) -> bool;

    /// Close the connection and clean up resources.
    fn stop(&mut self);
}
