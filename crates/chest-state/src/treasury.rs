//! Treasury guard and health reporting.

use chest_core::constants::{
    BPS_SCALE, HEALTH_LOW_RESERVES_BPS, HEALTH_STABLE_BPS, HEALTH_VERY_HEALTHY_BPS,
};
use chest_core::error::ChestError;
use chest_core::totals::LedgerTotals;
use chest_core::types::Balance;
use chest_payout::worst_case_payout;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Admission check for a new stake of `amount`, evaluated before the stake
/// enters custody:
///
///   treasury_balance >= active_locked + amount × MAX_MULTIPLIER
///
/// Recomputed from the totals on every lock; nothing is reserved.
pub fn check_admission(totals: &LedgerTotals, amount: Balance) -> Result<(), ChestError> {
    let worst_case = worst_case_payout(amount)?;
    let required = totals
        .active_locked
        .checked_add(worst_case)
        .ok_or(ChestError::ArithmeticOverflow)?;
    debug!(
        amount,
        worst_case,
        required,
        available = totals.treasury_balance,
        "treasury admission"
    );
    if totals.treasury_balance < required {
        return Err(ChestError::InsufficientTreasury {
            required,
            available: totals.treasury_balance,
        });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Nothing is locked.
    Safe,
    VeryHealthy,
    Stable,
    LowReserves,
    AtRisk,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Safe => "Safe",
            HealthStatus::VeryHealthy => "Very Healthy",
            HealthStatus::Stable => "Stable",
            HealthStatus::LowReserves => "Low Reserves",
            HealthStatus::AtRisk => "At Risk",
        }
    }
}

/// Informational snapshot. Never consulted by lock or claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryHealth {
    pub status: HealthStatus,
    /// treasury_balance / active_locked in bps; `None` when nothing is locked.
    pub ratio_bps: Option<u128>,
    pub treasury_balance: Balance,
    pub active_locked: Balance,
}

pub fn assess_health(totals: &LedgerTotals) -> TreasuryHealth {
    let ratio_bps = (totals.active_locked > 0).then(|| {
        totals
            .treasury_balance
            .checked_mul(BPS_SCALE)
            .map(|scaled| scaled / totals.active_locked)
            .unwrap_or(u128::MAX)
    });

    let status = match ratio_bps {
        None => HealthStatus::Safe,
        Some(r) if r >= HEALTH_VERY_HEALTHY_BPS => HealthStatus::VeryHealthy,
        Some(r) if r >= HEALTH_STABLE_BPS => HealthStatus::Stable,
        Some(r) if r >= HEALTH_LOW_RESERVES_BPS => HealthStatus::LowReserves,
        Some(_) => HealthStatus::AtRisk,
    };

    TreasuryHealth {
        status,
        ratio_bps,
        treasury_balance: totals.treasury_balance,
        active_locked: totals.active_locked,
    }
}
