use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_GUARANTEE_1H_BPS, BASE_GUARANTEE_24H_BPS, BASE_GUARANTEE_6H_BPS, DEFAULT_FEE_PERCENT,
    DEFAULT_MIN_STAKE, DURATION_1H_SECS, DURATION_24H_SECS, DURATION_6H_SECS,
    GUARANTEE_CEILING_BPS, MAX_FEE_PERCENT,
};
use crate::error::ChestError;
use crate::types::{AccountId, AccountKey, Balance, LockDuration};

// ── AdminCredential ───────────────────────────────────────────────────────────

/// Identity presented to administrator-only operations. Checked against the
/// configured admin at the start of every mutating configuration call.
///
/// Only built from an [`AccountKey`], so holding one means the caller held
/// the key of the account it names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCredential {
    caller: AccountId,
}

impl AdminCredential {
    pub fn from_key(key: &AccountKey) -> Self {
        Self { caller: key.account_id() }
    }

    pub fn caller(&self) -> &AccountId {
        &self.caller
    }
}

// ── DurationTier ──────────────────────────────────────────────────────────────

/// One accepted lock period and its base guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTier {
    pub duration: LockDuration,
    pub base_guarantee_bps: u32,
}

// ── ChestConfig ───────────────────────────────────────────────────────────────

/// Owner-controlled parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChestConfig {
    pub admin: AccountId,
    pub min_stake: Balance,
    /// Whole percent applied to the gross payout at claim time.
    pub fee_percent: u8,
    /// Sorted by duration ascending; base guarantee strictly increasing.
    pub tiers: Vec<DurationTier>,
}

impl ChestConfig {
    /// Protocol defaults: 1 token minimum, 2% fee, 1h/6h/24h tiers.
    pub fn with_defaults(admin: AccountId) -> Self {
        Self {
            admin,
            min_stake: DEFAULT_MIN_STAKE,
            fee_percent: DEFAULT_FEE_PERCENT,
            tiers: vec![
                DurationTier {
                    duration: LockDuration(DURATION_1H_SECS),
                    base_guarantee_bps: BASE_GUARANTEE_1H_BPS,
                },
                DurationTier {
                    duration: LockDuration(DURATION_6H_SECS),
                    base_guarantee_bps: BASE_GUARANTEE_6H_BPS,
                },
                DurationTier {
                    duration: LockDuration(DURATION_24H_SECS),
                    base_guarantee_bps: BASE_GUARANTEE_24H_BPS,
                },
            ],
        }
    }

    pub fn authorize(&self, credential: &AdminCredential) -> Result<(), ChestError> {
        if credential.caller() != &self.admin {
            return Err(ChestError::Unauthorized);
        }
        Ok(())
    }

    /// Base guarantee for `duration`, or `InvalidDuration` if it is not an
    /// accepted lock period.
    pub fn tier_for(&self, duration: LockDuration) -> Result<u32, ChestError> {
        self.tiers
            .iter()
            .find(|t| t.duration == duration)
            .map(|t| t.base_guarantee_bps)
            .ok_or(ChestError::InvalidDuration { secs: duration.as_secs() })
    }

    pub fn validate_fee(percent: u8) -> Result<(), ChestError> {
        if percent > MAX_FEE_PERCENT {
            return Err(ChestError::FeeOutOfRange { max: MAX_FEE_PERCENT, got: percent });
        }
        Ok(())
    }

    /// Insert or replace the tier for `duration`, keeping the table sorted
    /// and strictly increasing.
    pub fn upsert_tier(&mut self, duration: LockDuration, base_bps: u32) -> Result<(), ChestError> {
        if duration.as_secs() == 0 {
            return Err(ChestError::InvalidDuration { secs: 0 });
        }
        if base_bps >= GUARANTEE_CEILING_BPS {
            return Err(ChestError::TierOutOfRange {
                bps: base_bps,
                ceiling: GUARANTEE_CEILING_BPS,
            });
        }

        let mut tiers = self.tiers.clone();
        match tiers.iter_mut().find(|t| t.duration == duration) {
            Some(t) => t.base_guarantee_bps = base_bps,
            None => tiers.push(DurationTier { duration, base_guarantee_bps: base_bps }),
        }
        tiers.sort_by_key(|t| t.duration);

        if tiers
            .windows(2)
            .any(|w| w[1].base_guarantee_bps <= w[0].base_guarantee_bps)
        {
            return Err(ChestError::TierOrderViolation);
        }
        self.tiers = tiers;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AccountId {
        AccountId::from_label("admin")
    }

    #[test]
    fn defaults_accept_three_durations() {
        let cfg = ChestConfig::with_defaults(admin());
        assert_eq!(cfg.tier_for(LockDuration(3_600)), Ok(2_000));
        assert_eq!(cfg.tier_for(LockDuration(21_600)), Ok(3_500));
        assert_eq!(cfg.tier_for(LockDuration(86_400)), Ok(4_500));
        assert_eq!(
            cfg.tier_for(LockDuration(7_200)),
            Err(ChestError::InvalidDuration { secs: 7_200 })
        );
    }

    #[test]
    fn authorize_rejects_other_callers() {
        let cfg = ChestConfig::with_defaults(admin());
        assert!(cfg.authorize(&AdminCredential::from_key(&AccountKey::from_label("admin"))).is_ok());
        assert_eq!(
            cfg.authorize(&AdminCredential::from_key(&AccountKey::from_label("mallory"))),
            Err(ChestError::Unauthorized)
        );
        // The admin id is public; using its bytes as a key names another account.
        assert_eq!(
            cfg.authorize(&AdminCredential::from_key(&AccountKey::from_bytes(admin().0))),
            Err(ChestError::Unauthorized)
        );
    }

    #[test]
    fn fee_range_is_zero_to_ten() {
        assert!(ChestConfig::validate_fee(0).is_ok());
        assert!(ChestConfig::validate_fee(10).is_ok());
        assert_eq!(
            ChestConfig::validate_fee(11),
            Err(ChestError::FeeOutOfRange { max: 10, got: 11 })
        );
    }

    #[test]
    fn upsert_tier_keeps_order() {
        let mut cfg = ChestConfig::with_defaults(admin());
        cfg.upsert_tier(LockDuration(12 * 3_600), 4_000).unwrap();
        let durations: Vec<u64> = cfg.tiers.iter().map(|t| t.duration.as_secs()).collect();
        assert_eq!(durations, vec![3_600, 21_600, 43_200, 86_400]);
    }

    #[test]
    fn upsert_tier_rejects_inversion() {
        let mut cfg = ChestConfig::with_defaults(admin());
        let before = cfg.clone();
        assert_eq!(
            cfg.upsert_tier(LockDuration(3_600), 4_000),
            Err(ChestError::TierOrderViolation)
        );
        assert_eq!(cfg, before);
    }

    #[test]
    fn upsert_tier_rejects_ceiling() {
        let mut cfg = ChestConfig::with_defaults(admin());
        assert!(matches!(
            cfg.upsert_tier(LockDuration(7 * 86_400), 8_000),
            Err(ChestError::TierOutOfRange { .. })
        ));
    }
}
