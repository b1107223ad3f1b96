use serde::{Deserialize, Serialize};

use crate::error::ChestError;
use crate::types::Balance;

/// Global counters and the treasury balance, stored as one record so every
/// reader sees them change together.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Cumulative stake ever locked. Never decreases.
    pub total_locked: Balance,
    /// Stake of all unclaimed locks.
    pub active_locked: Balance,
    /// Cumulative gross payout, before fees.
    pub total_paid_out: Balance,
    pub total_fees_collected: Balance,
    /// Tokens held by the engine and available to pay claims.
    pub treasury_balance: Balance,
    /// Locks created so far across all owners. Mixed into seed derivation.
    pub lock_nonce: u64,
    /// Next audit-trail sequence number.
    pub event_seq: u64,
}

fn add(a: Balance, b: Balance) -> Result<Balance, ChestError> {
    a.checked_add(b).ok_or(ChestError::ArithmeticOverflow)
}

fn sub(a: Balance, b: Balance) -> Result<Balance, ChestError> {
    a.checked_sub(b).ok_or(ChestError::ArithmeticOverflow)
}

impl LedgerTotals {
    /// A new stake of `amount` entered custody.
    pub fn record_lock(&mut self, amount: Balance) -> Result<(), ChestError> {
        self.total_locked = add(self.total_locked, amount)?;
        self.active_locked = add(self.active_locked, amount)?;
        self.treasury_balance = add(self.treasury_balance, amount)?;
        self.lock_nonce = self.lock_nonce.checked_add(1).ok_or(ChestError::ArithmeticOverflow)?;
        Ok(())
    }

    /// A lock of `amount` was claimed for `gross`, of which `fee` stays in
    /// the treasury and `gross − fee` leaves custody.
    pub fn record_claim(&mut self, amount: Balance, gross: Balance, fee: Balance) -> Result<(), ChestError> {
        let net = sub(gross, fee)?;
        self.active_locked = sub(self.active_locked, amount)?;
        self.total_paid_out = add(self.total_paid_out, gross)?;
        self.total_fees_collected = add(self.total_fees_collected, fee)?;
        self.treasury_balance = sub(self.treasury_balance, net)?;
        Ok(())
    }

    pub fn record_funding(&mut self, amount: Balance) -> Result<(), ChestError> {
        self.treasury_balance = add(self.treasury_balance, amount)?;
        Ok(())
    }

    /// Take the next event sequence number.
    pub fn next_event_seq(&mut self) -> u64 {
        let seq = self.event_seq;
        self.event_seq += 1;
        seq
    }
}
