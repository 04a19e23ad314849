//! Application layer for Parley
//!
//! Generic async runtime that executes the actions of the sans-IO
//! [`parley_client::Client`] and publishes render snapshots to screens. The
//! same runtime runs against production I/O and the simulation harness.
//!
//! # Components
//!
//! - [`Driver`]: Trait for the channel transport
//! - [`ChatApi`]: Trait for the REST collaborator (history, roster, read acks)
//! - [`Runtime`]: Event loop multiplexing screens, transport and fetches
//! - [`SessionHandle`]: Clonable handle injected into screens
//! - [`SystemEnv`]: Production environment (system clock, OS randomness)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod driver;
mod error;
mod handle;
mod runtime;
mod system_env;

pub use api::ChatApi;
pub use config::RuntimeConfig;
pub use driver::{Driver, Handshake};
pub use error::{ApiError, SessionError};
pub use handle::SessionHandle;
pub use runtime::Runtime;
pub use system_env::SystemEnv;
