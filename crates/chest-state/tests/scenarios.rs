//! End-to-end ledger scenarios against a real sled database.

use std::sync::Arc;

use chest_core::constants::{DURATION_1H_SECS, DURATION_24H_SECS, DURATION_6H_SECS, UNITS_PER_TOKEN};
use chest_core::error::ChestError;
use chest_core::lock::LockStatus;
use chest_core::types::{AccountId, Balance, LockDuration, Timestamp};
use chest_state::{
    apply_genesis, fund_dev_ledger, ChestEngine, DevBalance, DeterministicSeedSource,
    GenesisParams, SledTokenLedger, StateDb, TokenLedger,
};

const T0: Timestamp = 1_750_000_000;
const TOKEN: Balance = UNITS_PER_TOKEN;

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("chest_scenario_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn admin() -> AccountId {
    AccountId::from_label("admin")
}

fn user(n: u32) -> AccountId {
    AccountId::from_label(&format!("user-{n}"))
}

/// Fresh ledger with `treasury` tokens in custody and `users` funded,
/// approved accounts.
fn fresh(name: &str, treasury: Balance, users: u32) -> (ChestEngine, Arc<SledTokenLedger>) {
    let db = Arc::new(StateDb::open(temp_dir(name)).unwrap());
    apply_genesis(&db, &GenesisParams::new(admin(), treasury)).unwrap();
    let ledger = Arc::new(SledTokenLedger::open(&db, AccountId::from_label("custody")).unwrap());
    ledger.mint(&ledger.custody().clone(), treasury).unwrap();
    for n in 0..users {
        ledger.mint(&user(n), 50_000 * TOKEN).unwrap();
        ledger.approve(&user(n), u128::MAX).unwrap();
    }
    let engine = ChestEngine::new(db, ledger.clone(), Box::new(DeterministicSeedSource::new([9u8; 32])));
    (engine, ledger)
}

#[test]
fn treasury_capacity_boundary() {
    let (engine, _) = fresh("capacity", 100_000 * TOKEN, 2);
    let hour = LockDuration(DURATION_1H_SECS);

    assert!(matches!(
        engine.create_lock(&user(0), 20_001 * TOKEN, hour, T0),
        Err(ChestError::InsufficientTreasury { .. })
    ));
    engine.create_lock(&user(0), 20_000 * TOKEN, hour, T0).unwrap();

    // 120,000 held against 20,000 active: exactly enough for another 20,000.
    engine.create_lock(&user(1), 20_000 * TOKEN, hour, T0).unwrap();

    // 140,000 held against 40,000 active.
    let err = engine.create_lock(&user(1), 20_001 * TOKEN, hour, T0).unwrap_err();
    assert_eq!(
        err,
        ChestError::InsufficientTreasury { required: 140_005 * TOKEN, available: 140_000 * TOKEN }
    );
    assert_eq!(engine.get_lock_count(&user(1)).unwrap(), 1);
}

#[test]
fn claim_applies_fee_to_treasury_and_counters() {
    let (engine, ledger) = fresh("fee", 100_000 * TOKEN, 1);
    let owner = user(0);
    engine.create_lock(&owner, 1_000 * TOKEN, LockDuration(DURATION_6H_SECS), T0).unwrap();
    let before = engine.get_totals().unwrap();

    let outcome = engine.claim(&owner, 0, T0 + DURATION_6H_SECS as i64).unwrap();
    let after = engine.get_totals().unwrap();

    let gross = outcome.fee.gross_payout;
    assert_eq!(outcome.fee.fee_amount, gross * 2 / 100);
    assert_eq!(outcome.fee.net_payout, gross - outcome.fee.fee_amount);
    assert_eq!(after.treasury_balance, before.treasury_balance - outcome.fee.net_payout);
    assert_eq!(after.total_paid_out, gross);
    assert_eq!(after.total_fees_collected, outcome.fee.fee_amount);
    assert_eq!(after.active_locked, 0);
    assert_eq!(after.total_locked, 1_000 * TOKEN);
    assert_eq!(ledger.balance_of(&owner).unwrap(), 49_000 * TOKEN + outcome.fee.net_payout);
}

#[test]
fn locks_claim_independently_in_any_order() {
    let (engine, _) = fresh("claim_order", 1_000_000 * TOKEN, 1);
    let owner = user(0);
    for d in [DURATION_1H_SECS, DURATION_6H_SECS, DURATION_24H_SECS] {
        engine.create_lock(&owner, 100 * TOKEN, LockDuration(d), T0).unwrap();
    }
    let at = T0 + DURATION_24H_SECS as i64;

    engine.claim(&owner, 2, at).unwrap();
    engine.claim(&owner, 0, at).unwrap();
    assert_eq!(engine.get_lock(&owner, 1).unwrap().status(at), LockStatus::Unlockable);
    engine.claim(&owner, 1, at).unwrap();

    let locks = engine.get_locks(&owner).unwrap();
    assert!(locks.iter().all(|l| l.claimed));
    assert_eq!(locks.iter().map(|l| l.index).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn preview_bounds_hold_for_realized_payout() {
    let (engine, _) = fresh("preview_bounds", 10_000_000 * TOKEN, 1);
    let owner = user(0);
    for i in 0..20u64 {
        engine.create_lock(&owner, (10 + i as u128 * 37) * TOKEN, LockDuration(DURATION_1H_SECS), T0).unwrap();
    }
    for i in 0..20u64 {
        let preview = engine.preview_payout(&owner, i).unwrap();
        let gross = engine.calculate_payout(&owner, i).unwrap();
        assert!(gross >= preview.min_payout && gross <= preview.max_payout);
        let outcome = engine.claim(&owner, i, T0 + 3_600).unwrap();
        assert_eq!(outcome.fee.gross_payout, gross);
    }
}

#[test]
fn custody_matches_recorded_treasury() {
    let (engine, ledger) = fresh("custody", 1_000_000 * TOKEN, 3);
    for n in 0..3 {
        engine.create_lock(&user(n), 500 * TOKEN, LockDuration(DURATION_1H_SECS), T0).unwrap();
        engine.create_lock(&user(n), 250 * TOKEN, LockDuration(DURATION_24H_SECS), T0).unwrap();
    }
    engine.fund_treasury(&user(2), 1_000 * TOKEN).unwrap();
    for n in 0..3 {
        engine.claim(&user(n), 0, T0 + 3_600).unwrap();
    }

    let totals = engine.get_totals().unwrap();
    assert_eq!(ledger.balance_of(ledger.custody()).unwrap(), totals.treasury_balance);
    assert_eq!(totals.active_locked, 750 * TOKEN);
    assert_eq!(totals.total_locked, 2_250 * TOKEN);
}

#[test]
fn concurrent_locks_get_distinct_indices() {
    let (engine, _) = fresh("concurrent", 10_000_000 * TOKEN, 1);
    let engine = Arc::new(engine);
    let owner = user(0);

    std::thread::scope(|s| {
        for _ in 0..8 {
            let engine = engine.clone();
            let owner = owner.clone();
            s.spawn(move || {
                for _ in 0..5 {
                    engine.create_lock(&owner, 10 * TOKEN, LockDuration(DURATION_1H_SECS), T0).unwrap();
                }
            });
        }
    });

    let locks = engine.get_locks(&owner).unwrap();
    assert_eq!(locks.len(), 40);
    assert!(locks.iter().enumerate().all(|(i, l)| l.index == i as u64));
    let totals = engine.get_totals().unwrap();
    assert_eq!(totals.active_locked, 400 * TOKEN);
    assert_eq!(totals.lock_nonce, 40);

    let mut seeds: Vec<_> = locks.iter().map(|l| l.random_seed).collect();
    seeds.sort_by_key(|s| *s.as_bytes());
    seeds.dedup();
    assert_eq!(seeds.len(), 40);
}

#[test]
fn ledger_survives_reopen() {
    let dir = temp_dir("reopen");
    let owner = user(0);
    let custody = AccountId::from_label("custody");
    let mut params = GenesisParams::new(admin(), 100_000 * TOKEN);
    params.dev_balances = vec![DevBalance { account: owner.to_b58(), amount: 1_000 * TOKEN }];

    let seed_before = {
        let db = Arc::new(StateDb::open(&dir).unwrap());
        apply_genesis(&db, &params).unwrap();
        let ledger = Arc::new(SledTokenLedger::open(&db, custody.clone()).unwrap());
        fund_dev_ledger(&ledger, &params).unwrap();
        ledger.approve(&owner, 500 * TOKEN).unwrap();
        let engine = ChestEngine::new(db.clone(), ledger.clone(), Box::new(DeterministicSeedSource::new([1u8; 32])));
        engine.create_lock(&owner, 100 * TOKEN, LockDuration(DURATION_6H_SECS), T0).unwrap();
        db.flush().unwrap();
        engine.get_lock(&owner, 0).unwrap().random_seed
    };

    let db = Arc::new(StateDb::open(&dir).unwrap());
    assert!(db.is_initialized());
    let ledger = Arc::new(SledTokenLedger::open(&db, custody).unwrap());
    let engine = ChestEngine::new(db, ledger.clone(), Box::new(DeterministicSeedSource::new([2u8; 32])));
    let lock = engine.get_lock(&owner, 0).unwrap();
    assert_eq!(lock.random_seed, seed_before);
    assert_eq!(lock.amount, 100 * TOKEN);
    assert_eq!(engine.get_lock_count(&owner).unwrap(), 1);
    assert_eq!(engine.get_treasury_balance().unwrap(), 100_100 * TOKEN);

    // Token balances and the remaining allowance come back with the ledger.
    assert_eq!(ledger.balance_of(&owner).unwrap(), 900 * TOKEN);
    assert_eq!(ledger.balance_of(ledger.custody()).unwrap(), 100_100 * TOKEN);
    assert_eq!(ledger.allowance(&owner).unwrap(), 400 * TOKEN);

    let outcome = engine.claim(&owner, 0, T0 + DURATION_6H_SECS as i64).unwrap();
    assert_eq!(ledger.balance_of(&owner).unwrap(), 900 * TOKEN + outcome.fee.net_payout);
}
