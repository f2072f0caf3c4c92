//! A deterministic, seeded-RNG lossy/corrupting virtual serial channel.
//!
//! This protocol has no async runtime to simulate against, so a plain
//! seeded-RNG byte channel is enough to exercise retransmission and
//! checksum-mismatch handling without pulling in a full network simulator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Per-byte fault injection applied while bytes cross a [`LossyChannel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultProfile {
    /// Probability in `[0.0, 1.0]` that a given byte is dropped entirely.
    pub drop_probability: f64,
    /// Probability in `[0.0, 1.0]` that a given byte survives but is flipped.
    pub corrupt_probability: f64,
}

impl FaultProfile {
    /// No drops, no corruption: bytes pass through unchanged.
    #[must_use]
    pub fn clean() -> Self {
        Self { drop_probability: 0.0, corrupt_probability: 0.0 }
    }
}

impl Default for FaultProfile {
    fn default() -> Self {
        Self::clean()
    }
}

/// A one-directional, seeded, byte-level fault injector standing in for a
/// real serial link.
///
/// Two communicators wired through a pair of `LossyChannel`s (one per
/// direction) reproduce the half-duplex, unreliable, variable-latency link
/// the engine is designed against, deterministically and without any real
/// I/O.
#[derive(Debug)]
pub struct LossyChannel {
    rng: ChaCha8Rng,
    profile: FaultProfile,
}

impl LossyChannel {
    /// Construct a channel seeded for reproducible runs.
    #[must_use]
    pub fn new(seed: u64, profile: FaultProfile) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), profile }
    }

    /// Pass `bytes` through the channel, dropping or corrupting per
    /// [`FaultProfile`]. Dropped bytes are omitted from the result;
    /// corrupted bytes are flipped to a different value and kept in place.
    pub fn transmit(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            if self.rng.gen_bool(self.profile.drop_probability) {
                trace!(byte, "channel dropped byte");
                continue;
            }
            if self.rng.gen_bool(self.profile.corrupt_probability) {
                let flipped = byte ^ self.rng.gen_range(1..=u8::MAX);
                trace!(original = byte, flipped, "channel corrupted byte");
                out.push(flipped);
            } else {
                out.push(byte);
            }
        }
        out
    }
}
