//! Environment abstraction for deterministic testing.
//!
//! Decouples synchronization logic from system resources (wall clock,
//! randomness). Simulation uses a seeded RNG and a manual clock so that
//! client-generated message ids and timestamps are reproducible; production
//! uses the system clock and OS entropy.

/// Abstract environment providing time and randomness.
///
/// # Invariants
///
/// - `unix_millis()` is the wall clock. It is only used for display
///   timestamps on optimistic messages and is never compared across clients.
/// - Given the same seed, `random_bytes()` produces the same sequence.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time in Unix milliseconds.
    fn unix_millis(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
