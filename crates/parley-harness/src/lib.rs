//! Deterministic simulation harness for Parley.
//!
//! In-process implementations of the server, the channel transport
//! ([`parley_app::Driver`]), the REST collaborator ([`parley_app::ChatApi`])
//! and the [`parley_core::env::Environment`], so the production runtime can be
//! exercised end to end without sockets.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties against session
//! snapshots. Invariants verify WHAT must be true across all execution paths,
//! not specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! synchronization invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_api;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ActiveRowMatchesRoom, Invariant, InvariantRegistry, InvariantResult, RoomIsolation,
    RoomScopedHandlers, SessionSnapshot, TimelineDedup, TypingSelfExclusion, Violation,
};
pub use scenario::{
    CONVERSATION, ScenarioConfig, ScenarioError, ScenarioReport, run_conversation, spawn_session,
    wait_for_view,
};
pub use sim_api::SimApi;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_server::{SimError, SimServer, SimServerConfig};
