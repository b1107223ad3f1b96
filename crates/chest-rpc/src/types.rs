use serde::{Deserialize, Serialize};

// Token amounts are u128 base units and travel as decimal strings.

/// JSON-serializable lock returned by `chest_getUserLocks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcLock {
    pub index: u64,
    pub owner: String,
    pub amount: String,
    pub duration_secs: u64,
    pub lock_time: i64,
    pub unlock_at: i64,
    /// Hex-encoded 32-byte seed.
    pub random_seed: String,
    pub base_guarantee_bps: u32,
    /// "Active", "Unlockable" or "Claimed".
    pub status: String,
    pub claimed: bool,
    pub claim: Option<RpcClaimRecord>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcClaimRecord {
    pub gross_payout: String,
    pub fee_amount: String,
    pub net_payout: String,
    pub claimed_at: i64,
}

/// Returned by `chest_previewPayout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPayoutPreview {
    pub guarantee_bps: u32,
    pub guaranteed_amount: String,
    pub risk_portion: String,
    pub min_payout: String,
    pub max_payout: String,
}

/// Returned by `chest_claim`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcClaimResult {
    pub index: u64,
    pub multiplier_bps: u32,
    pub guaranteed_amount: String,
    pub risk_reward: String,
    pub gross_payout: String,
    pub fee_amount: String,
    pub net_payout: String,
}

/// Returned by `chest_getTotals`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcTotals {
    pub total_locked: String,
    pub active_locked: String,
    pub total_paid_out: String,
    pub total_fees_collected: String,
    pub treasury_balance: String,
    pub locks_created: u64,
}

/// Returned by `chest_getHealth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcHealth {
    pub status: String,
    /// treasury / active, two decimals; null when nothing is locked.
    pub ratio: Option<String>,
    pub treasury_balance: String,
    pub active_locked: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcTier {
    pub duration_secs: u64,
    pub base_guarantee_bps: u32,
}

/// Returned by `chest_getConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub admin: String,
    pub min_stake: String,
    pub fee_percent: u8,
    pub tiers: Vec<RpcTier>,
}

/// One audit-trail entry returned by `chest_getEvents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEvent {
    pub seq: u64,
    /// "LockCreated", "LockClaimed" or "TreasuryFunded".
    pub kind: String,
    /// Lock owner, or the funder for treasury funding.
    pub account: String,
    pub index: Option<u64>,
    /// Staked or funded amount.
    pub amount: String,
    pub gross_payout: Option<String>,
    pub random_seed: Option<String>,
}

/// Returned by `chest_simulatePayouts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSimulation {
    pub runs: u64,
    pub base_guarantee_bps: u32,
    pub fee_percent: u8,
    pub total_staked: String,
    pub total_gross: String,
    pub total_net: String,
    pub total_fees: String,
    /// total_net / total_staked, two decimals.
    pub net_ratio: String,
    pub treasury_grows: bool,
}
