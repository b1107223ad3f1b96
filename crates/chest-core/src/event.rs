use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, LockDuration, LockIndex, RandomSeed, Timestamp};

/// Observable ledger events, persisted in commit order as the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChestEvent {
    LockCreated {
        owner: AccountId,
        index: LockIndex,
        amount: Balance,
        duration: LockDuration,
        lock_time: Timestamp,
        random_seed: RandomSeed,
    },
    LockClaimed {
        owner: AccountId,
        index: LockIndex,
        staked_amount: Balance,
        gross_payout: Balance,
        guaranteed_amount: Balance,
        /// Risk portion after the multiplier is applied.
        risk_reward: Balance,
    },
    TreasuryFunded {
        funder: AccountId,
        amount: Balance,
    },
}

impl ChestEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChestEvent::LockCreated { .. } => "LockCreated",
            ChestEvent::LockClaimed { .. } => "LockClaimed",
            ChestEvent::TreasuryFunded { .. } => "TreasuryFunded",
        }
    }
}
