use thiserror::Error;

use crate::types::{Balance, Timestamp};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChestError {
    // ── Lock admission errors ────────────────────────────────────────────────
    #[error("amount below minimum stake: need at least {min}, got {got}")]
    BelowMinimumStake { min: Balance, got: Balance },

    #[error("invalid duration: {secs} seconds is not an accepted lock period")]
    InvalidDuration { secs: u64 },

    #[error("treasury too low for this stake: requires {required}, available {available}")]
    InsufficientTreasury { required: Balance, available: Balance },

    // ── Claim errors ─────────────────────────────────────────────────────────
    #[error("lock does not exist: index {index}")]
    LockNotFound { index: u64 },

    #[error("lock already claimed")]
    LockAlreadyClaimed,

    #[error("lock period not finished (unlocks at {unlock_at})")]
    LockNotYetUnlockable { unlock_at: Timestamp },

    // ── Admin errors ─────────────────────────────────────────────────────────
    #[error("caller is not the administrator")]
    Unauthorized,

    #[error("fee percent out of range: max {max}, got {got}")]
    FeeOutOfRange { max: u8, got: u8 },

    #[error("guarantee tier out of range: {bps} bps (ceiling {ceiling} bps)")]
    TierOutOfRange { bps: u32, ceiling: u32 },

    #[error("guarantee tiers must increase with duration")]
    TierOrderViolation,

    // ── Token ledger errors ──────────────────────────────────────────────────
    #[error("allowance or balance insufficient: need {need}, have {have}")]
    AllowanceOrBalanceInsufficient { need: Balance, have: Balance },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    // ── Arithmetic ───────────────────────────────────────────────────────────
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("ledger not initialized; apply genesis first")]
    NotInitialized,
}
