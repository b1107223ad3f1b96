use serde::{Deserialize, Serialize};

use crate::error::ChestError;
use crate::types::{AccountId, Balance, LockDuration, LockIndex, RandomSeed, Timestamp};

// ── LockStatus ────────────────────────────────────────────────────────────────

/// Derived claim state of a lock at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStatus {
    /// Unclaimed, before the unlock instant.
    Active,
    /// Unclaimed, at or after the unlock instant.
    Unlockable,
    /// Terminal.
    Claimed,
}

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Active => "Active",
            LockStatus::Unlockable => "Unlockable",
            LockStatus::Claimed => "Claimed",
        }
    }
}

// ── ClaimRecord ───────────────────────────────────────────────────────────────

/// Payout fixed at claim time. Never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub gross_payout: Balance,
    pub fee_amount: Balance,
    pub net_payout: Balance,
    pub claimed_at: Timestamp,
}

// ── Lock ──────────────────────────────────────────────────────────────────────

/// One deposit as stored in the lock ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub owner: AccountId,
    pub index: LockIndex,
    pub amount: Balance,
    pub duration: LockDuration,
    pub lock_time: Timestamp,
    pub random_seed: RandomSeed,
    /// Base guarantee of the duration tier in effect at creation.
    pub base_guarantee_bps: u32,
    pub claimed: bool,
    pub claim: Option<ClaimRecord>,
}

impl Lock {
    /// The instant from which the lock may be claimed. Constant for the life
    /// of the lock.
    pub fn unlock_at(&self) -> Timestamp {
        self.lock_time.saturating_add(self.duration.as_secs() as i64)
    }

    pub fn status(&self, now: Timestamp) -> LockStatus {
        if self.claimed {
            LockStatus::Claimed
        } else if now >= self.unlock_at() {
            LockStatus::Unlockable
        } else {
            LockStatus::Active
        }
    }

    /// Check that the lock may be claimed at `now`.
    pub fn ensure_claimable(&self, now: Timestamp) -> Result<(), ChestError> {
        match self.status(now) {
            LockStatus::Claimed => Err(ChestError::LockAlreadyClaimed),
            LockStatus::Active => Err(ChestError::LockNotYetUnlockable {
                unlock_at: self.unlock_at(),
            }),
            LockStatus::Unlockable => Ok(()),
        }
    }

    /// Human-readable summary.
    pub fn describe(&self, now: Timestamp) -> String {
        let status_str = match (&self.claim, self.status(now)) {
            (Some(c), _) => format!(
                "Claimed at {}, gross {} / net {}",
                c.claimed_at, c.gross_payout, c.net_payout
            ),
            (None, LockStatus::Active) => {
                let secs = self.unlock_at() - now;
                format!("Active, unlocks in {}m {}s", secs / 60, secs % 60)
            }
            (None, _) => "Unlockable, ready to claim".to_string(),
        };
        format!(
            "Lock #{} | {} units for {} | owner: {} | {}",
            self.index, self.amount, self.duration, self.owner, status_str
        )
    }
}
