//! Guarantee curve.
//!
//! guarantee_bps = min(base(duration) + MAX_BONUS × amount / (amount + K), CEILING)
//!
//! The bonus approaches MAX_AMOUNT_BONUS_BPS asymptotically; half of it is
//! earned at `AMOUNT_BONUS_HALF_POINT`. The ceiling keeps the guaranteed
//! portion strictly below the stake.

use chest_core::constants::{
    AMOUNT_BONUS_HALF_POINT, BPS_SCALE, GUARANTEE_CEILING_BPS, MAX_AMOUNT_BONUS_BPS,
};
use chest_core::error::ChestError;
use chest_core::types::Balance;

/// Diminishing-returns bonus for stake size, in bps.
pub fn amount_bonus_bps(amount: Balance) -> u32 {
    let Some(denominator) = amount.checked_add(AMOUNT_BONUS_HALF_POINT) else {
        return MAX_AMOUNT_BONUS_BPS;
    };
    match amount.checked_mul(MAX_AMOUNT_BONUS_BPS as u128) {
        Some(numerator) => (numerator / denominator) as u32,
        // amount is astronomically larger than K; the curve has saturated.
        None => MAX_AMOUNT_BONUS_BPS,
    }
}

/// Total guarantee percentage in bps, clamped to the ceiling.
pub fn guarantee_bps(base_bps: u32, amount: Balance) -> u32 {
    base_bps
        .saturating_add(amount_bonus_bps(amount))
        .min(GUARANTEE_CEILING_BPS)
}

/// `amount × guarantee_bps / 10_000`, floored.
pub fn guaranteed_amount(amount: Balance, guarantee_bps: u32) -> Result<Balance, ChestError> {
    amount
        .checked_mul(guarantee_bps as u128)
        .map(|v| v / BPS_SCALE)
        .ok_or(ChestError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chest_core::constants::{
        BASE_GUARANTEE_1H_BPS, BASE_GUARANTEE_24H_BPS, BASE_GUARANTEE_6H_BPS, UNITS_PER_TOKEN,
    };

    #[test]
    fn bonus_is_half_at_half_point() {
        assert_eq!(amount_bonus_bps(AMOUNT_BONUS_HALF_POINT), MAX_AMOUNT_BONUS_BPS / 2);
    }

    #[test]
    fn bonus_negligible_for_small_stakes() {
        // 10 tokens → 3000 × 10 / 2010 = 14 bps
        assert_eq!(amount_bonus_bps(10 * UNITS_PER_TOKEN), 14);
        assert_eq!(amount_bonus_bps(0), 0);
    }

    #[test]
    fn bonus_saturates_without_overflow() {
        assert!(amount_bonus_bps(u128::MAX) <= MAX_AMOUNT_BONUS_BPS);
        assert!(amount_bonus_bps(u128::MAX / 2) <= MAX_AMOUNT_BONUS_BPS);
    }

    #[test]
    fn guarantee_clamped_at_ceiling() {
        assert_eq!(guarantee_bps(6_000, u128::MAX / 4), GUARANTEE_CEILING_BPS);
        assert_eq!(guarantee_bps(7_900, 1_000_000 * UNITS_PER_TOKEN), GUARANTEE_CEILING_BPS);
    }

    #[test]
    fn guaranteed_strictly_below_amount() {
        for tokens in [1u128, 10, 100, 5_000, 10_000, 1_000_000] {
            let amount = tokens * UNITS_PER_TOKEN;
            for base in [BASE_GUARANTEE_1H_BPS, BASE_GUARANTEE_6H_BPS, BASE_GUARANTEE_24H_BPS] {
                let g = guaranteed_amount(amount, guarantee_bps(base, amount)).unwrap();
                assert!(g < amount, "guaranteed {g} must be < {amount}");
            }
        }
    }

    #[test]
    fn guaranteed_monotonic_in_amount() {
        let mut prev = 0;
        for tokens in (1u128..=20_000).step_by(37) {
            let amount = tokens * UNITS_PER_TOKEN;
            let g = guaranteed_amount(amount, guarantee_bps(BASE_GUARANTEE_1H_BPS, amount)).unwrap();
            assert!(g >= prev, "guarantee decreased at {tokens} tokens");
            prev = g;
        }
    }

    #[test]
    fn guaranteed_monotonic_in_duration_tier() {
        let amount = 250 * UNITS_PER_TOKEN;
        let g1 = guaranteed_amount(amount, guarantee_bps(BASE_GUARANTEE_1H_BPS, amount)).unwrap();
        let g6 = guaranteed_amount(amount, guarantee_bps(BASE_GUARANTEE_6H_BPS, amount)).unwrap();
        let g24 = guaranteed_amount(amount, guarantee_bps(BASE_GUARANTEE_24H_BPS, amount)).unwrap();
        assert!(g1 < g6 && g6 < g24);
    }

    #[test]
    fn large_stake_between_thirty_and_ceiling() {
        let amount = 5_000 * UNITS_PER_TOKEN;
        let g = guaranteed_amount(amount, guarantee_bps(BASE_GUARANTEE_1H_BPS, amount)).unwrap();
        assert!(g > amount * 30 / 100);
        assert!(g <= amount * 80 / 100);
    }
}
