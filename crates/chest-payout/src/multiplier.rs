use chest_core::constants::{MAX_MULTIPLIER_BPS, MIN_MULTIPLIER_BPS};
use chest_core::types::{AccountId, LockIndex, RandomSeed};

/// Domain separator so the multiplier hash can never coincide with any other
/// BLAKE3 use of the same seed.
const MULTIPLIER_DOMAIN: &[u8] = b"chest/multiplier/v1";

/// Derive the risk multiplier (bps) for a lock.
///
/// BLAKE3(domain ‖ seed ‖ owner ‖ index BE), first 8 bytes LE, reduced onto
/// `[MIN_MULTIPLIER_BPS, MAX_MULTIPLIER_BPS]` inclusive. Pure: the same lock
/// always yields the same multiplier.
pub fn multiplier_bps(seed: &RandomSeed, owner: &AccountId, index: LockIndex) -> u32 {
    let mut h = blake3::Hasher::new();
    h.update(MULTIPLIER_DOMAIN);
    h.update(seed.as_bytes());
    h.update(owner.as_bytes());
    h.update(&index.to_be_bytes());
    let digest = h.finalize();

    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    let span = (MAX_MULTIPLIER_BPS - MIN_MULTIPLIER_BPS) as u64 + 1;
    MIN_MULTIPLIER_BPS + (u64::from_le_bytes(word) % span) as u32
}
