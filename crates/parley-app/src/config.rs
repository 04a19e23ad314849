//! Runtime configuration.

use std::time::Duration;

/// Runtime tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Capacity of the screen command queue.
    pub command_buffer: usize,
    /// Open the channel as soon as the runtime starts.
    pub connect_on_start: bool,
    /// Fetch the conversation roster as soon as the runtime starts.
    pub fetch_roster_on_start: bool,
    /// Upper bound on a single collaborator call.
    pub fetch_timeout: Duration,
    /// Upper bound on the channel handshake.
    pub connect_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            connect_on_start: true,
            fetch_roster_on_start: true,
            fetch_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
