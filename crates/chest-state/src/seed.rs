//! Seed sources.
//!
//! A lock's random seed is fixed when the lock is created and never changes.
//! The engine takes the source as an injected capability so tests can swap
//! in a reproducible one.

use chest_core::types::{AccountId, LockIndex, RandomSeed, Timestamp};

/// Everything known about a lock at the moment its seed is drawn.
#[derive(Debug, Clone, Copy)]
pub struct SeedContext<'a> {
    pub owner: &'a AccountId,
    pub index: LockIndex,
    pub lock_time: Timestamp,
    /// Global count of locks created before this one.
    pub nonce: u64,
}

impl SeedContext<'_> {
    fn hash_into(&self, h: &mut blake3::Hasher) {
        h.update(self.owner.as_bytes());
        h.update(&self.index.to_be_bytes());
        h.update(&self.lock_time.to_be_bytes());
        h.update(&self.nonce.to_be_bytes());
    }
}

/// Produces the seed of a new lock. Implementations must never return the
/// same seed for two locks, including two locks of one owner created at the
/// same instant.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self, ctx: &SeedContext<'_>) -> RandomSeed;
}

/// BLAKE3(OS entropy ‖ owner ‖ index ‖ lock_time ‖ nonce).
///
/// The entropy is drawn after the request is serialized by the engine's
/// writer lock, so the locking party cannot choose it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropySeedSource;

impl SeedSource for EntropySeedSource {
    fn next_seed(&self, ctx: &SeedContext<'_>) -> RandomSeed {
        let entropy: [u8; 32] = rand::random();
        let mut h = blake3::Hasher::new();
        h.update(&entropy);
        ctx.hash_into(&mut h);
        RandomSeed(*h.finalize().as_bytes())
    }
}

/// Reproducible seeds: BLAKE3(base ‖ owner ‖ index ‖ lock_time ‖ nonce).
#[derive(Debug, Clone, Copy)]
pub struct DeterministicSeedSource {
    base: [u8; 32],
}

impl DeterministicSeedSource {
    pub fn new(base: [u8; 32]) -> Self {
        Self { base }
    }
}

impl SeedSource for DeterministicSeedSource {
    fn next_seed(&self, ctx: &SeedContext<'_>) -> RandomSeed {
        let mut h = blake3::Hasher::new();
        h.update(&self.base);
        ctx.hash_into(&mut h);
        RandomSeed(*h.finalize().as_bytes())
    }
}
