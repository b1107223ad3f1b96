use std::sync::{Arc, Mutex, MutexGuard};

use chest_core::config::{AdminCredential, ChestConfig};
use chest_core::error::ChestError;
use chest_core::event::ChestEvent;
use chest_core::lock::{ClaimRecord, Lock};
use chest_core::totals::LedgerTotals;
use chest_core::types::{AccountId, Balance, LockDuration, LockIndex, Timestamp};
use chest_payout::{calculate_payout, preview_payout, split_fee, FeeSplit, PayoutBreakdown, PayoutPreview};
use tracing::{info, warn};

use crate::db::{StagedMutations, StateDb};
use crate::seed::{SeedContext, SeedSource};
use crate::token::{TokenLedger, TransferReceipt};
use crate::treasury::{assess_health, check_admission, TreasuryHealth};

/// Largest page returned by [`ChestEngine::get_events`].
pub const MAX_EVENT_PAGE: usize = 500;

/// Result of a successful claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub index: LockIndex,
    pub payout: PayoutBreakdown,
    pub fee: FeeSplit,
}

// ── ChestEngine ───────────────────────────────────────────────────────────────

/// The ledger engine.
///
/// Lock creation, claims, treasury funding and configuration changes are
/// serialized by one writer lock and committed in a single storage
/// transaction each; a failed operation leaves every tree untouched. Reads
/// do not take the writer lock.
pub struct ChestEngine {
    db: Arc<StateDb>,
    ledger: Arc<dyn TokenLedger>,
    seeds: Box<dyn SeedSource>,
    writer: Mutex<()>,
}

impl ChestEngine {
    pub fn new(db: Arc<StateDb>, ledger: Arc<dyn TokenLedger>, seeds: Box<dyn SeedSource>) -> Self {
        Self { db, ledger, seeds, writer: Mutex::new(()) }
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`; a panic elsewhere cannot leave it torn.
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_config(&self) -> Result<ChestConfig, ChestError> {
        self.db.get_config()?.ok_or(ChestError::NotInitialized)
    }

    fn load_totals(&self) -> Result<LedgerTotals, ChestError> {
        self.db.get_totals()?.ok_or(ChestError::NotInitialized)
    }

    /// Commit `staged`; if that fails, undo the transfer that preceded it.
    fn commit_or_reverse(
        &self,
        staged: &StagedMutations,
        receipt: Option<&TransferReceipt>,
    ) -> Result<(), ChestError> {
        let Err(e) = self.db.commit(staged) else {
            return Ok(());
        };
        if let Some(r) = receipt {
            warn!(error = %e, amount = r.amount, "commit failed; reversing transfer");
            if let Err(rev) = self.ledger.reverse(r) {
                warn!(error = %rev, from = %r.from, to = %r.to, amount = r.amount, "transfer reversal failed");
            }
        }
        Err(e)
    }

    // ── Lock ──────────────────────────────────────────────────────────────────

    /// Lock `amount` of `owner`'s tokens for `duration`. Returns the new
    /// lock's index, stable for the life of the ledger.
    pub fn create_lock(
        &self,
        owner: &AccountId,
        amount: Balance,
        duration: LockDuration,
        now: Timestamp,
    ) -> Result<LockIndex, ChestError> {
        let _guard = self.write_guard();
        let config = self.load_config()?;

        // ── Configuration validation ──────────────────────────────────────────
        if amount == 0 || amount < config.min_stake {
            return Err(ChestError::BelowMinimumStake { min: config.min_stake.max(1), got: amount });
        }
        let base_guarantee_bps = config.tier_for(duration)?;

        // ── Treasury admission ────────────────────────────────────────────────
        let mut totals = self.load_totals()?;
        check_admission(&totals, amount)?;

        // ── Stage the new lock ────────────────────────────────────────────────
        let index = self.db.lock_count(owner)?;
        let random_seed = self.seeds.next_seed(&SeedContext {
            owner,
            index,
            lock_time: now,
            nonce: totals.lock_nonce,
        });
        let lock = Lock {
            owner: owner.clone(),
            index,
            amount,
            duration,
            lock_time: now,
            random_seed,
            base_guarantee_bps,
            claimed: false,
            claim: None,
        };
        totals.record_lock(amount)?;

        let mut staged = StagedMutations::default();
        let seq = totals.next_event_seq();
        staged.events.push((seq, ChestEvent::LockCreated {
            owner: owner.clone(),
            index,
            amount,
            duration,
            lock_time: now,
            random_seed,
        }));
        staged.locks.push(lock);
        staged.lock_counts.push((owner.clone(), index + 1));
        staged.totals = Some(totals);

        // ── Pull the stake, then commit ───────────────────────────────────────
        let receipt = self.ledger.transfer_from(owner, amount)?;
        self.commit_or_reverse(&staged, Some(&receipt))?;

        info!(%owner, index, amount, %duration, seed = %random_seed, "lock created");
        Ok(index)
    }

    // ── Claim ─────────────────────────────────────────────────────────────────

    /// Claim lock `index` of `caller`. Ownership mismatch and a missing index
    /// are both reported as `LockNotFound`.
    pub fn claim(&self, caller: &AccountId, index: LockIndex, now: Timestamp) -> Result<ClaimOutcome, ChestError> {
        let _guard = self.write_guard();
        let config = self.load_config()?;
        let mut totals = self.load_totals()?;

        let mut lock = self
            .db
            .get_lock(caller, index)?
            .ok_or(ChestError::LockNotFound { index })?;
        lock.ensure_claimable(now)?;

        let payout = calculate_payout(&lock)?;
        let fee = split_fee(payout.gross_payout, config.fee_percent)?;
        if totals.treasury_balance < fee.net_payout {
            return Err(ChestError::InsufficientTreasury {
                required: fee.net_payout,
                available: totals.treasury_balance,
            });
        }

        totals.record_claim(lock.amount, fee.gross_payout, fee.fee_amount)?;
        lock.claimed = true;
        lock.claim = Some(ClaimRecord {
            gross_payout: fee.gross_payout,
            fee_amount: fee.fee_amount,
            net_payout: fee.net_payout,
            claimed_at: now,
        });

        let mut staged = StagedMutations::default();
        let seq = totals.next_event_seq();
        staged.events.push((seq, ChestEvent::LockClaimed {
            owner: caller.clone(),
            index,
            staked_amount: lock.amount,
            gross_payout: payout.gross_payout,
            guaranteed_amount: payout.guaranteed_amount,
            risk_reward: payout.risk_reward,
        }));
        staged.locks.push(lock);
        staged.totals = Some(totals);

        // ── Push the net payout, then commit ──────────────────────────────────
        let receipt = match fee.net_payout {
            0 => None,
            net => Some(self.ledger.transfer(caller, net)?),
        };
        self.commit_or_reverse(&staged, receipt.as_ref())?;

        info!(
            owner = %caller,
            index,
            gross = fee.gross_payout,
            fee = fee.fee_amount,
            net = fee.net_payout,
            multiplier_bps = payout.multiplier_bps,
            "lock claimed"
        );
        Ok(ClaimOutcome { index, payout, fee })
    }

    // ── Treasury funding ──────────────────────────────────────────────────────

    /// Move `amount` from `funder` (via allowance) into the treasury.
    pub fn fund_treasury(&self, funder: &AccountId, amount: Balance) -> Result<(), ChestError> {
        if amount == 0 {
            return Err(ChestError::ZeroAmount);
        }
        let _guard = self.write_guard();
        let mut totals = self.load_totals()?;
        totals.record_funding(amount)?;

        let mut staged = StagedMutations::default();
        let seq = totals.next_event_seq();
        staged.events.push((seq, ChestEvent::TreasuryFunded { funder: funder.clone(), amount }));
        let treasury_balance = totals.treasury_balance;
        staged.totals = Some(totals);

        let receipt = self.ledger.transfer_from(funder, amount)?;
        self.commit_or_reverse(&staged, Some(&receipt))?;

        info!(%funder, amount, treasury_balance, "treasury funded");
        Ok(())
    }

    // ── Administration ────────────────────────────────────────────────────────

    fn update_config<F>(&self, credential: &AdminCredential, f: F) -> Result<ChestConfig, ChestError>
    where
        F: FnOnce(&mut ChestConfig) -> Result<(), ChestError>,
    {
        let _guard = self.write_guard();
        let mut config = self.load_config()?;
        if let Err(e) = config.authorize(credential) {
            warn!(caller = %credential.caller(), "unauthorized configuration change");
            return Err(e);
        }
        f(&mut config)?;
        self.db.commit(&StagedMutations { config: Some(config.clone()), ..Default::default() })?;
        Ok(config)
    }

    pub fn set_min_stake(&self, credential: &AdminCredential, value: Balance) -> Result<(), ChestError> {
        self.update_config(credential, |c| {
            c.min_stake = value;
            Ok(())
        })?;
        info!(min_stake = value, "minimum stake updated");
        Ok(())
    }

    pub fn set_fee(&self, credential: &AdminCredential, percent: u8) -> Result<(), ChestError> {
        self.update_config(credential, |c| {
            ChestConfig::validate_fee(percent)?;
            c.fee_percent = percent;
            Ok(())
        })?;
        info!(fee_percent = percent, "claim fee updated");
        Ok(())
    }

    /// Add or update the guarantee tier of `duration`. Existing locks keep the
    /// tier they were created with.
    pub fn set_tier(
        &self,
        credential: &AdminCredential,
        duration: LockDuration,
        base_guarantee_bps: u32,
    ) -> Result<(), ChestError> {
        self.update_config(credential, |c| c.upsert_tier(duration, base_guarantee_bps))?;
        info!(%duration, base_guarantee_bps, "guarantee tier updated");
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn get_locks(&self, owner: &AccountId) -> Result<Vec<Lock>, ChestError> {
        self.db.get_locks(owner)
    }

    pub fn get_lock_count(&self, owner: &AccountId) -> Result<u64, ChestError> {
        self.db.lock_count(owner)
    }

    pub fn get_lock(&self, owner: &AccountId, index: LockIndex) -> Result<Lock, ChestError> {
        self.db.get_lock(owner, index)?.ok_or(ChestError::LockNotFound { index })
    }

    pub fn preview_payout(&self, owner: &AccountId, index: LockIndex) -> Result<PayoutPreview, ChestError> {
        preview_payout(&self.get_lock(owner, index)?)
    }

    /// Gross payout of a lock: the recorded figure once claimed, otherwise
    /// the value a claim would realize.
    pub fn calculate_payout(&self, owner: &AccountId, index: LockIndex) -> Result<Balance, ChestError> {
        let lock = self.get_lock(owner, index)?;
        match &lock.claim {
            Some(record) => Ok(record.gross_payout),
            None => Ok(calculate_payout(&lock)?.gross_payout),
        }
    }

    pub fn get_treasury_balance(&self) -> Result<Balance, ChestError> {
        Ok(self.load_totals()?.treasury_balance)
    }

    pub fn get_totals(&self) -> Result<LedgerTotals, ChestError> {
        self.load_totals()
    }

    pub fn get_config(&self) -> Result<ChestConfig, ChestError> {
        self.load_config()
    }

    pub fn health(&self) -> Result<TreasuryHealth, ChestError> {
        Ok(assess_health(&self.load_totals()?))
    }

    pub fn get_events(&self, from_seq: u64, limit: usize) -> Result<Vec<(u64, ChestEvent)>, ChestError> {
        self.db.get_events(from_seq, limit.min(MAX_EVENT_PAGE))
    }
}
