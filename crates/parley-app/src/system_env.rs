//! Production environment using the system clock and OS randomness.

use std::time::{SystemTime, UNIX_EPOCH};

use parley_core::env::Environment;

/// Production environment.
///
/// Randomness only feeds client-generated message ids, so an OS RNG failure
/// degrades to clock-derived bytes instead of aborting the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn unix_nanos() -> u128 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default()
    }
}

impl Environment for SystemEnv {
    fn unix_millis(&self) -> u64 {
        u64::try_from(Self::unix_nanos() / 1_000_000).unwrap_or(u64::MAX)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(error) = getrandom::fill(buffer) {
            tracing::warn!(%error, "OS RNG unavailable, deriving bytes from clock");
            let seed = Self::unix_nanos().to_le_bytes();
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = seed[i % seed.len()] ^ (i as u8);
            }
        }
    }
}
