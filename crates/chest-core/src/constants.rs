/// ─── Chest Protocol Constants ───────────────────────────────────────────────
///
/// Stake for a fixed duration, receive a guaranteed floor plus a randomized
/// reward on the remainder, paid from a shared treasury.
///
/// Base unit: 1 token = 10^18 units (18 decimals).
/// All percentages are expressed in basis points (1% = 100 bps) unless the
/// name says otherwise.

// ── Units ────────────────────────────────────────────────────────────────────

/// Token decimals.
pub const TOKEN_DECIMALS: u32 = 18;

/// 1 token expressed in base units.
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator.
pub const BPS_SCALE: u128 = 10_000;

// ── Durations (seconds) ──────────────────────────────────────────────────────

pub const DURATION_1H_SECS: u64 = 3_600;
pub const DURATION_6H_SECS: u64 = 6 * 3_600;
pub const DURATION_24H_SECS: u64 = 24 * 3_600;

// ── Guarantee curve ──────────────────────────────────────────────────────────

/// Default base guarantee per duration tier.
pub const BASE_GUARANTEE_1H_BPS: u32 = 2_000;
pub const BASE_GUARANTEE_6H_BPS: u32 = 3_500;
pub const BASE_GUARANTEE_24H_BPS: u32 = 4_500;

/// Asymptotic amount bonus: MAX_AMOUNT_BONUS_BPS * amount / (amount + K).
pub const MAX_AMOUNT_BONUS_BPS: u32 = 3_000;

/// K of the bonus curve: the stake at which half of the bonus is earned.
pub const AMOUNT_BONUS_HALF_POINT: u128 = 2_000 * UNITS_PER_TOKEN;

/// Hard ceiling on base + bonus. The guaranteed portion never reaches the
/// full stake.
pub const GUARANTEE_CEILING_BPS: u32 = 8_000;

// ── Multiplier ───────────────────────────────────────────────────────────────

/// Lower bound of the risk multiplier (0.5x).
pub const MIN_MULTIPLIER_BPS: u32 = 5_000;

/// Upper bound of the risk multiplier (5.0x). Also the worst case used by
/// treasury admission.
pub const MAX_MULTIPLIER_BPS: u32 = 50_000;

// ── Configuration defaults ───────────────────────────────────────────────────

/// Default minimum stake (1 token).
pub const DEFAULT_MIN_STAKE: u128 = UNITS_PER_TOKEN;

/// Default claim fee (whole percent).
pub const DEFAULT_FEE_PERCENT: u8 = 2;

/// Maximum claim fee an administrator may configure (whole percent).
pub const MAX_FEE_PERCENT: u8 = 10;

// ── Treasury health thresholds (treasury / active_locked, in bps) ────────────

pub const HEALTH_VERY_HEALTHY_BPS: u128 = 20_000;
pub const HEALTH_STABLE_BPS: u128 = 15_000;
pub const HEALTH_LOW_RESERVES_BPS: u128 = 11_000;
