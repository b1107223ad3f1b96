//! Payout simulation.
//!
//! Runs the calculator over `runs` synthetic seeds for one stake size and
//! duration tier and reports the aggregate payout ratio. Used by operators to
//! size treasury funding; has no effect on the ledger.

use chest_core::constants::BPS_SCALE;
use chest_core::error::ChestError;
use chest_core::lock::Lock;
use chest_core::types::{AccountId, Balance, LockDuration, RandomSeed};
use serde::{Deserialize, Serialize};

use crate::calculator::{calculate_payout, split_fee};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub runs: u64,
    pub total_staked: Balance,
    pub total_gross: Balance,
    pub total_net: Balance,
    pub total_fees: Balance,
    /// total_net / total_staked in bps. Below 10_000 the treasury grows.
    pub net_ratio_bps: u128,
}

impl SimulationReport {
    pub fn treasury_grows(&self) -> bool {
        self.net_ratio_bps < BPS_SCALE
    }
}

/// Simulate `runs` claims of `amount` at `base_guarantee_bps` with `fee_percent`.
pub fn simulate_payouts(
    amount: Balance,
    base_guarantee_bps: u32,
    fee_percent: u8,
    runs: u64,
) -> Result<SimulationReport, ChestError> {
    let owner = AccountId::from_label("simulation");
    let mut report = SimulationReport {
        runs,
        total_staked: 0,
        total_gross: 0,
        total_net: 0,
        total_fees: 0,
        net_ratio_bps: 0,
    };

    for i in 0..runs {
        let lock = Lock {
            owner: owner.clone(),
            index: i,
            amount,
            duration: LockDuration(0),
            lock_time: 0,
            random_seed: RandomSeed(*blake3::hash(&i.to_le_bytes()).as_bytes()),
            base_guarantee_bps,
            claimed: false,
            claim: None,
        };
        let gross = calculate_payout(&lock)?.gross_payout;
        let fee = split_fee(gross, fee_percent)?;

        report.total_staked = add(report.total_staked, amount)?;
        report.total_gross = add(report.total_gross, gross)?;
        report.total_net = add(report.total_net, fee.net_payout)?;
        report.total_fees = add(report.total_fees, fee.fee_amount)?;
    }

    if report.total_staked > 0 {
        report.net_ratio_bps = report
            .total_net
            .checked_mul(BPS_SCALE)
            .ok_or(ChestError::ArithmeticOverflow)?
            / report.total_staked;
    }
    Ok(report)
}

fn add(a: Balance, b: Balance) -> Result<Balance, ChestError> {
    a.checked_add(b).ok_or(ChestError::ArithmeticOverflow)
}
