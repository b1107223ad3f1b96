//! chest-payout
//!
//! Pure payout arithmetic for chest locks. Nothing here touches storage:
//! every function maps immutable lock fields to amounts, so a preview and
//! the eventual claim always agree.
//!
//!   guarantee  — duration tier + asymptotic amount bonus, clamped
//!   multiplier — seed → risk multiplier in [0.5x, 5.0x]
//!   calculator — guaranteed / risk / gross payout, fee split, worst case
//!   simulate   — average payout ratio over many seeds

pub mod calculator;
pub mod guarantee;
pub mod multiplier;
pub mod simulate;

pub use calculator::{
    calculate_payout, preview_payout, split_fee, worst_case_payout, FeeSplit, PayoutBreakdown,
    PayoutPreview,
};
pub use guarantee::{amount_bonus_bps, guarantee_bps, guaranteed_amount};
pub use multiplier::multiplier_bps;
pub use simulate::{simulate_payouts, SimulationReport};
