//! Client
//!
//! Action-based chat client state machine. Wires the synchronization
//! components of [`parley_core`] into one session: connection, active room,
//! timeline, typing presence, unread counts and the conversation list.
//!
//! # Architecture
//!
//! The client is Sans-IO. It receives events ([`ClientEvent`]) from the
//! transport, from completed fetches and from the user, processes them through
//! pure state machine logic, and returns actions ([`ClientAction`]) for the
//! caller to execute. Fetch results re-enter as events, so nothing blocks.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine for one session
//! - [`ClientConfig`]: Identity and reconciliation settings
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//! - [`ClientView`]: Snapshot rendered by screens

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod event;
mod view;

pub use client::{Client, Handler};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use parley_core::{MergePolicy, env::Environment};
pub use view::ClientView;
