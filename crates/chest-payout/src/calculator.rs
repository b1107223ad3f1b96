//! Payout calculator.
//!
//!   guaranteed = amount × guarantee_bps / 10_000                (floor)
//!   risk       = amount − guaranteed
//!   gross      = (guaranteed × 10_000 + risk × multiplier_bps) / 10_000
//!
//! The gross payout is floored exactly once, at the end, so no rounding error
//! accumulates across the intermediate steps.

use chest_core::constants::{BPS_SCALE, MAX_MULTIPLIER_BPS, MIN_MULTIPLIER_BPS};
use chest_core::error::ChestError;
use chest_core::lock::Lock;
use chest_core::types::Balance;
use serde::{Deserialize, Serialize};

use crate::guarantee::{guarantee_bps, guaranteed_amount};
use crate::multiplier::multiplier_bps;

/// Bounds shown to the user before claiming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPreview {
    pub guarantee_bps: u32,
    pub guaranteed_amount: Balance,
    pub risk_portion: Balance,
    /// Gross payout at the minimum multiplier.
    pub min_payout: Balance,
    /// Gross payout at the maximum multiplier.
    pub max_payout: Balance,
}

/// Realized gross payout of a lock and its components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBreakdown {
    pub guaranteed_amount: Balance,
    pub risk_portion: Balance,
    pub multiplier_bps: u32,
    /// risk_portion × multiplier, i.e. gross − guaranteed.
    pub risk_reward: Balance,
    pub gross_payout: Balance,
}

/// Claim fee split of a gross payout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub gross_payout: Balance,
    pub fee_amount: Balance,
    pub net_payout: Balance,
}

struct Split {
    guarantee_bps: u32,
    guaranteed: Balance,
    risk: Balance,
}

fn split_stake(amount: Balance, base_bps: u32) -> Result<Split, ChestError> {
    let bps = guarantee_bps(base_bps, amount);
    let guaranteed = guaranteed_amount(amount, bps)?;
    Ok(Split {
        guarantee_bps: bps,
        guaranteed,
        risk: amount - guaranteed,
    })
}

fn gross_at(guaranteed: Balance, risk: Balance, mult_bps: u32) -> Result<Balance, ChestError> {
    guaranteed
        .checked_mul(BPS_SCALE)
        .and_then(|g| risk.checked_mul(mult_bps as u128).and_then(|r| g.checked_add(r)))
        .map(|scaled| scaled / BPS_SCALE)
        .ok_or(ChestError::ArithmeticOverflow)
}

/// Guaranteed amount and the min/max gross payout of a lock.
pub fn preview_payout(lock: &Lock) -> Result<PayoutPreview, ChestError> {
    let s = split_stake(lock.amount, lock.base_guarantee_bps)?;
    Ok(PayoutPreview {
        guarantee_bps: s.guarantee_bps,
        guaranteed_amount: s.guaranteed,
        risk_portion: s.risk,
        min_payout: gross_at(s.guaranteed, s.risk, MIN_MULTIPLIER_BPS)?,
        max_payout: gross_at(s.guaranteed, s.risk, MAX_MULTIPLIER_BPS)?,
    })
}

/// The gross payout this lock realizes. Depends only on immutable lock
/// fields, so repeated calls return the same value.
pub fn calculate_payout(lock: &Lock) -> Result<PayoutBreakdown, ChestError> {
    let s = split_stake(lock.amount, lock.base_guarantee_bps)?;
    let mult = multiplier_bps(&lock.random_seed, &lock.owner, lock.index);
    let gross = gross_at(s.guaranteed, s.risk, mult)?;
    Ok(PayoutBreakdown {
        guaranteed_amount: s.guaranteed,
        risk_portion: s.risk,
        multiplier_bps: mult,
        risk_reward: gross - s.guaranteed,
        gross_payout: gross,
    })
}

/// `fee = gross × fee_percent / 100` (floor), `net = gross − fee`.
pub fn split_fee(gross_payout: Balance, fee_percent: u8) -> Result<FeeSplit, ChestError> {
    let fee_amount = gross_payout
        .checked_mul(fee_percent as u128)
        .map(|v| v / 100)
        .ok_or(ChestError::ArithmeticOverflow)?;
    Ok(FeeSplit {
        gross_payout,
        fee_amount,
        net_payout: gross_payout - fee_amount,
    })
}

/// Upper bound of what a stake of `amount` can ever pay: `amount × MAX_MULTIPLIER`.
/// Shares `MAX_MULTIPLIER_BPS` with the calculator so admission and payout
/// can never disagree on the worst case. Rounded up.
pub fn worst_case_payout(amount: Balance) -> Result<Balance, ChestError> {
    amount
        .checked_mul(MAX_MULTIPLIER_BPS as u128)
        .map(|v| v.div_ceil(BPS_SCALE))
        .ok_or(ChestError::ArithmeticOverflow)
}
