use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in base units (1 token = 10^18 units).
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Position of a lock within its owner's append-only list.
pub type LockIndex = u64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Id of the dev account whose key is derived from `label`.
    pub fn from_label(label: &str) -> Self {
        AccountKey::from_label(label).account_id()
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| bs58::decode::Error::BufferTooSmall)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "AccountId({})", &b58[..b58.len().min(8)])
    }
}

// ── AccountKey ───────────────────────────────────────────────────────────────

const ACCOUNT_ID_CONTEXT: &str = "chest 2026 account id v1";

/// 32-byte secret held by an account owner. The account id is a one-way
/// derivation of it, so presenting the key proves ownership of the id while
/// the id itself can be published.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountKey([u8; 32]);

impl AccountKey {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    /// Dev key derived as BLAKE3(label). Anyone who knows the label holds the
    /// key, so this is only for local networks and tests.
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn account_id(&self) -> AccountId {
        AccountId(blake3::derive_key(ACCOUNT_ID_CONTEXT, &self.0))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut b = [0u8; 32];
        hex::decode_to_slice(s, &mut b)?;
        Ok(Self(b))
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({})", self.account_id().to_b58())
    }
}

// ── RandomSeed ───────────────────────────────────────────────────────────────

/// Opaque 256-bit value fixed when a lock is created. The risk multiplier is
/// a pure function of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomSeed(pub [u8; 32]);

impl RandomSeed {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for RandomSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for RandomSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomSeed({}…)", &self.to_hex()[..16])
    }
}

// ── LockDuration ─────────────────────────────────────────────────────────────

/// Lock period in seconds. Only durations with a configured guarantee tier
/// are accepted by the engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct LockDuration(pub u64);

impl LockDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 3_600 == 0 {
            write!(f, "{}h", self.0 / 3_600)
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_b58_roundtrip() {
        let id = AccountId::from_label("alice");
        let parsed = AccountId::from_b58(&id.to_b58()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn account_id_rejects_garbage() {
        assert!(AccountId::from_b58("0OIl").is_err());
    }

    #[test]
    fn key_derives_a_different_id() {
        let key = AccountKey::from_label("alice");
        let id = key.account_id();
        assert_eq!(id, AccountId::from_label("alice"));
        assert_ne!(id.as_bytes(), blake3::hash(b"alice").as_bytes());
        // The published id is not itself a valid key for that id.
        assert_ne!(AccountKey::from_bytes(id.0).account_id(), id);
    }

    #[test]
    fn key_hex_roundtrip() {
        let key = AccountKey::from_label("bob");
        assert_eq!(AccountKey::from_hex(&key.to_hex()).unwrap(), key);
        assert!(AccountKey::from_hex(&AccountId::from_label("bob").to_b58()).is_err());
        assert!(AccountKey::from_hex("abcd").is_err());
    }

    #[test]
    fn duration_display() {
        assert_eq!(LockDuration(3_600).to_string(), "1h");
        assert_eq!(LockDuration(86_400).to_string(), "24h");
        assert_eq!(LockDuration(90).to_string(), "90s");
    }
}
