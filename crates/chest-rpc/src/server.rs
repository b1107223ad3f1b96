use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use chest_core::config::AdminCredential;
use chest_core::error::ChestError;
use chest_core::event::ChestEvent;
use chest_core::lock::Lock;
use chest_core::types::{AccountId, AccountKey, Balance, LockDuration, Timestamp};
use chest_payout::simulate_payouts;
use chest_state::{ChestEngine, SledTokenLedger};

use crate::api::ChestApiServer;
use crate::types::{
    RpcClaimRecord, RpcClaimResult, RpcConfig, RpcEvent, RpcHealth, RpcLock, RpcPayoutPreview,
    RpcSimulation, RpcTier, RpcTotals,
};

/// Largest `runs` accepted by `chest_simulatePayouts`.
pub const MAX_SIMULATION_RUNS: u64 = 100_000;

// ── Error codes ───────────────────────────────────────────────────────────────

pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const BELOW_MINIMUM_STAKE: i32 = -32001;
pub const INVALID_DURATION: i32 = -32002;
pub const INSUFFICIENT_TREASURY: i32 = -32003;
pub const LOCK_NOT_FOUND: i32 = -32004;
pub const LOCK_ALREADY_CLAIMED: i32 = -32005;
pub const LOCK_NOT_YET_UNLOCKABLE: i32 = -32006;
pub const UNAUTHORIZED: i32 = -32007;
pub const INVALID_CONFIG: i32 = -32008;
pub const TOKEN_TRANSFER_FAILED: i32 = -32009;
pub const UNAVAILABLE: i32 = -32010;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn chest_err(e: ChestError) -> ErrorObject<'static> {
    let code = match &e {
        ChestError::BelowMinimumStake { .. } | ChestError::ZeroAmount => BELOW_MINIMUM_STAKE,
        ChestError::InvalidDuration { .. } => INVALID_DURATION,
        ChestError::InsufficientTreasury { .. } => INSUFFICIENT_TREASURY,
        ChestError::LockNotFound { .. } => LOCK_NOT_FOUND,
        ChestError::LockAlreadyClaimed => LOCK_ALREADY_CLAIMED,
        ChestError::LockNotYetUnlockable { .. } => LOCK_NOT_YET_UNLOCKABLE,
        ChestError::Unauthorized => UNAUTHORIZED,
        ChestError::FeeOutOfRange { .. }
        | ChestError::TierOutOfRange { .. }
        | ChestError::TierOrderViolation => INVALID_CONFIG,
        ChestError::AllowanceOrBalanceInsufficient { .. } => TOKEN_TRANSFER_FAILED,
        ChestError::ArithmeticOverflow
        | ChestError::Serialization(_)
        | ChestError::Storage(_)
        | ChestError::NotInitialized => INTERNAL_ERROR,
    };
    rpc_err(code, e.to_string())
}

fn parse_account(s: &str) -> Result<AccountId, ErrorObject<'static>> {
    AccountId::from_b58(s).map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid account id: {e}")))
}

/// Decode a hex account key. The error never echoes the input.
fn parse_key(s: &str) -> Result<AccountKey, ErrorObject<'static>> {
    AccountKey::from_hex(s)
        .map_err(|_| rpc_err(INVALID_PARAMS, "invalid account key: expected 64 hex characters"))
}

fn parse_amount(s: &str) -> Result<Balance, ErrorObject<'static>> {
    s.parse::<Balance>()
        .map_err(|e| rpc_err(INVALID_PARAMS, format!("invalid amount {s:?}: {e}")))
}

// ── Conversions ───────────────────────────────────────────────────────────────

fn rpc_lock(lock: &Lock, now: Timestamp) -> RpcLock {
    RpcLock {
        index: lock.index,
        owner: lock.owner.to_b58(),
        amount: lock.amount.to_string(),
        duration_secs: lock.duration.as_secs(),
        lock_time: lock.lock_time,
        unlock_at: lock.unlock_at(),
        random_seed: lock.random_seed.to_hex(),
        base_guarantee_bps: lock.base_guarantee_bps,
        status: lock.status(now).as_str().to_string(),
        claimed: lock.claimed,
        claim: lock.claim.as_ref().map(|c| RpcClaimRecord {
            gross_payout: c.gross_payout.to_string(),
            fee_amount: c.fee_amount.to_string(),
            net_payout: c.net_payout.to_string(),
            claimed_at: c.claimed_at,
        }),
        description: lock.describe(now),
    }
}

fn rpc_event(seq: u64, ev: &ChestEvent) -> RpcEvent {
    let kind = ev.kind().to_string();
    match ev {
        ChestEvent::LockCreated { owner, index, amount, random_seed, .. } => RpcEvent {
            seq,
            kind,
            account: owner.to_b58(),
            index: Some(*index),
            amount: amount.to_string(),
            gross_payout: None,
            random_seed: Some(random_seed.to_hex()),
        },
        ChestEvent::LockClaimed { owner, index, staked_amount, gross_payout, .. } => RpcEvent {
            seq,
            kind,
            account: owner.to_b58(),
            index: Some(*index),
            amount: staked_amount.to_string(),
            gross_payout: Some(gross_payout.to_string()),
            random_seed: None,
        },
        ChestEvent::TreasuryFunded { funder, amount } => RpcEvent {
            seq,
            kind,
            account: funder.to_b58(),
            index: None,
            amount: amount.to_string(),
            gross_payout: None,
            random_seed: None,
        },
    }
}

/// `ratio_bps` as a decimal with two places, e.g. 15_000 → "1.50".
fn format_ratio(ratio_bps: u128) -> String {
    format!("{}.{:02}", ratio_bps / 10_000, (ratio_bps % 10_000) / 100)
}

// ── Server ────────────────────────────────────────────────────────────────────

/// Source of the current Unix time for lock and claim calls.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub engine: Arc<ChestEngine>,
    /// Bundled dev token ledger backing `chest_approve` / `chest_balanceOf`.
    /// `None` when the engine is wired to an external ledger.
    pub tokens: Option<Arc<SledTokenLedger>>,
    pub clock: Clock,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    fn now(&self) -> Timestamp {
        (self.state.clock)()
    }

    fn tokens(&self) -> Result<&SledTokenLedger, ErrorObject<'static>> {
        self.state
            .tokens
            .as_deref()
            .ok_or_else(|| rpc_err(UNAVAILABLE, "token ledger not exposed by this node"))
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let middleware = tower::ServiceBuilder::new().layer(CorsLayer::permissive());
        let server = Server::builder()
            .set_http_middleware(middleware)
            .build(addr)
            .await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl ChestApiServer for RpcServer {
    async fn lock(&self, key: String, amount: String, duration_secs: u64) -> RpcResult<u64> {
        let owner = parse_key(&key)?.account_id();
        let amount = parse_amount(&amount)?;
        let index = self
            .state
            .engine
            .create_lock(&owner, amount, LockDuration::from_secs(duration_secs), self.now())
            .map_err(|e| {
                warn!(%owner, amount, duration_secs, error = %e, "RPC: lock rejected");
                chest_err(e)
            })?;
        Ok(index)
    }

    async fn claim(&self, key: String, index: u64) -> RpcResult<RpcClaimResult> {
        let owner = parse_key(&key)?.account_id();
        let outcome = self.state.engine.claim(&owner, index, self.now()).map_err(|e| {
            warn!(%owner, index, error = %e, "RPC: claim rejected");
            chest_err(e)
        })?;
        Ok(RpcClaimResult {
            index: outcome.index,
            multiplier_bps: outcome.payout.multiplier_bps,
            guaranteed_amount: outcome.payout.guaranteed_amount.to_string(),
            risk_reward: outcome.payout.risk_reward.to_string(),
            gross_payout: outcome.fee.gross_payout.to_string(),
            fee_amount: outcome.fee.fee_amount.to_string(),
            net_payout: outcome.fee.net_payout.to_string(),
        })
    }

    async fn get_user_locks(&self, owner: String) -> RpcResult<Vec<RpcLock>> {
        let owner = parse_account(&owner)?;
        let now = self.now();
        let locks = self.state.engine.get_locks(&owner).map_err(chest_err)?;
        Ok(locks.iter().map(|l| rpc_lock(l, now)).collect())
    }

    async fn get_user_lock_count(&self, owner: String) -> RpcResult<u64> {
        let owner = parse_account(&owner)?;
        Ok(self.state.engine.get_lock_count(&owner).map_err(chest_err)?)
    }

    async fn preview_payout(&self, owner: String, index: u64) -> RpcResult<RpcPayoutPreview> {
        let owner = parse_account(&owner)?;
        let p = self.state.engine.preview_payout(&owner, index).map_err(chest_err)?;
        Ok(RpcPayoutPreview {
            guarantee_bps: p.guarantee_bps,
            guaranteed_amount: p.guaranteed_amount.to_string(),
            risk_portion: p.risk_portion.to_string(),
            min_payout: p.min_payout.to_string(),
            max_payout: p.max_payout.to_string(),
        })
    }

    async fn calculate_payout(&self, owner: String, index: u64) -> RpcResult<String> {
        let owner = parse_account(&owner)?;
        let gross = self.state.engine.calculate_payout(&owner, index).map_err(chest_err)?;
        Ok(gross.to_string())
    }

    async fn fund_treasury(&self, key: String, amount: String) -> RpcResult<()> {
        let funder = parse_key(&key)?.account_id();
        let amount = parse_amount(&amount)?;
        self.state.engine.fund_treasury(&funder, amount).map_err(chest_err)?;
        Ok(())
    }

    async fn get_treasury_balance(&self) -> RpcResult<String> {
        Ok(self.state.engine.get_treasury_balance().map_err(chest_err)?.to_string())
    }

    async fn get_totals(&self) -> RpcResult<RpcTotals> {
        let t = self.state.engine.get_totals().map_err(chest_err)?;
        Ok(RpcTotals {
            total_locked: t.total_locked.to_string(),
            active_locked: t.active_locked.to_string(),
            total_paid_out: t.total_paid_out.to_string(),
            total_fees_collected: t.total_fees_collected.to_string(),
            treasury_balance: t.treasury_balance.to_string(),
            locks_created: t.lock_nonce,
        })
    }

    async fn get_health(&self) -> RpcResult<RpcHealth> {
        let h = self.state.engine.health().map_err(chest_err)?;
        Ok(RpcHealth {
            status: h.status.label().to_string(),
            ratio: h.ratio_bps.map(format_ratio),
            treasury_balance: h.treasury_balance.to_string(),
            active_locked: h.active_locked.to_string(),
        })
    }

    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>> {
        let events = self
            .state
            .engine
            .get_events(from_seq, limit as usize)
            .map_err(chest_err)?;
        Ok(events.iter().map(|(seq, ev)| rpc_event(*seq, ev)).collect())
    }

    async fn simulate_payouts(&self, amount: String, duration_secs: u64, runs: u64) -> RpcResult<RpcSimulation> {
        let amount = parse_amount(&amount)?;
        if runs > MAX_SIMULATION_RUNS {
            return Err(rpc_err(
                INVALID_PARAMS,
                format!("runs {runs} exceeds the limit of {MAX_SIMULATION_RUNS}"),
            ));
        }
        let config = self.state.engine.get_config().map_err(chest_err)?;
        let base_bps = config
            .tier_for(LockDuration::from_secs(duration_secs))
            .map_err(chest_err)?;
        let r = simulate_payouts(amount, base_bps, config.fee_percent, runs).map_err(chest_err)?;
        Ok(RpcSimulation {
            runs: r.runs,
            base_guarantee_bps: base_bps,
            fee_percent: config.fee_percent,
            total_staked: r.total_staked.to_string(),
            total_gross: r.total_gross.to_string(),
            total_net: r.total_net.to_string(),
            total_fees: r.total_fees.to_string(),
            net_ratio: format_ratio(r.net_ratio_bps),
            treasury_grows: r.treasury_grows(),
        })
    }

    async fn get_config(&self) -> RpcResult<RpcConfig> {
        let c = self.state.engine.get_config().map_err(chest_err)?;
        Ok(RpcConfig {
            admin: c.admin.to_b58(),
            min_stake: c.min_stake.to_string(),
            fee_percent: c.fee_percent,
            tiers: c
                .tiers
                .iter()
                .map(|t| RpcTier {
                    duration_secs: t.duration.as_secs(),
                    base_guarantee_bps: t.base_guarantee_bps,
                })
                .collect(),
        })
    }

    async fn set_min_stake(&self, admin_key: String, amount: String) -> RpcResult<()> {
        let cred = AdminCredential::from_key(&parse_key(&admin_key)?);
        let amount = parse_amount(&amount)?;
        self.state.engine.set_min_stake(&cred, amount).map_err(chest_err)?;
        Ok(())
    }

    async fn set_fee(&self, admin_key: String, percent: u8) -> RpcResult<()> {
        let cred = AdminCredential::from_key(&parse_key(&admin_key)?);
        self.state.engine.set_fee(&cred, percent).map_err(chest_err)?;
        Ok(())
    }

    async fn set_tier(&self, admin_key: String, duration_secs: u64, base_guarantee_bps: u32) -> RpcResult<()> {
        let cred = AdminCredential::from_key(&parse_key(&admin_key)?);
        self.state
            .engine
            .set_tier(&cred, LockDuration::from_secs(duration_secs), base_guarantee_bps)
            .map_err(chest_err)?;
        Ok(())
    }

    async fn approve(&self, key: String, amount: String) -> RpcResult<()> {
        let owner = parse_key(&key)?.account_id();
        let amount = parse_amount(&amount)?;
        self.tokens()?.approve(&owner, amount).map_err(chest_err)?;
        Ok(())
    }

    async fn balance_of(&self, account: String) -> RpcResult<String> {
        let account = parse_account(&account)?;
        Ok(self.tokens()?.balance_of(&account).map_err(chest_err)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_formatting() {
        assert_eq!(format_ratio(15_000), "1.50");
        assert_eq!(format_ratio(20_049), "2.00");
        assert_eq!(format_ratio(1_234_567), "123.45");
    }

    #[test]
    fn error_codes_distinguish_kinds() {
        assert_eq!(chest_err(ChestError::LockAlreadyClaimed).code(), LOCK_ALREADY_CLAIMED);
        assert_eq!(
            chest_err(ChestError::InsufficientTreasury { required: 2, available: 1 }).code(),
            INSUFFICIENT_TREASURY
        );
        assert_eq!(chest_err(ChestError::TierOrderViolation).code(), INVALID_CONFIG);
        assert_eq!(chest_err(ChestError::Storage("io".into())).code(), INTERNAL_ERROR);
    }

    #[test]
    fn bad_params_rejected() {
        assert_eq!(parse_amount("12x").unwrap_err().code(), INVALID_PARAMS);
        assert_eq!(parse_account("0OIl").unwrap_err().code(), INVALID_PARAMS);
        assert_eq!(parse_key("00ff").unwrap_err().code(), INVALID_PARAMS);
        assert_eq!(parse_amount("1000000000000000000000000").unwrap(), 10u128.pow(24));
    }

    // ── In-process calls ──────────────────────────────────────────────────────

    use chest_core::constants::UNITS_PER_TOKEN;
    use chest_state::{
        apply_genesis, fund_dev_ledger, DeterministicSeedSource, DevBalance, GenesisParams, StateDb,
    };

    const NOW: Timestamp = 1_700_000_000;
    const TOKEN: Balance = UNITS_PER_TOKEN;

    fn key(label: &str) -> AccountKey {
        AccountKey::from_label(label)
    }

    /// Server over a fresh ledger: "admin" administers, "holder" owns 1,000
    /// tokens in the dev ledger.
    fn test_server(name: &str) -> RpcServer {
        let dir = std::env::temp_dir().join(format!("chest_rpc_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        let db = Arc::new(StateDb::open(&dir).expect("open temp db"));

        let mut params = GenesisParams::new(key("admin").account_id(), 100_000 * TOKEN);
        params.dev_balances = vec![DevBalance {
            account: key("holder").account_id().to_b58(),
            amount: 1_000 * TOKEN,
        }];
        apply_genesis(&db, &params).unwrap();
        let tokens = Arc::new(SledTokenLedger::open(&db, AccountId::from_label("custody")).unwrap());
        fund_dev_ledger(&tokens, &params).unwrap();

        let engine = ChestEngine::new(db, tokens.clone(), Box::new(DeterministicSeedSource::new([7u8; 32])));
        let clock: Clock = Arc::new(|| NOW);
        RpcServer::new(Arc::new(RpcServerState {
            engine: Arc::new(engine),
            tokens: Some(tokens),
            clock,
        }))
    }

    #[tokio::test]
    async fn published_admin_id_cannot_change_config() {
        let server = test_server("admin_replay");
        let admin_id = server.get_config().await.unwrap().admin;

        let err = server.set_fee(admin_id.clone(), 10).await.unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);

        // The id's bytes used as a key name a different account.
        let id = AccountId::from_b58(&admin_id).unwrap();
        let as_key = AccountKey::from_bytes(*id.as_bytes()).to_hex();
        assert_eq!(server.set_fee(as_key, 10).await.unwrap_err().code(), UNAUTHORIZED);
        assert_eq!(
            server.set_min_stake(key("mallory").to_hex(), "0".into()).await.unwrap_err().code(),
            UNAUTHORIZED
        );
        assert_eq!(
            server.set_tier(key("mallory").to_hex(), 600, 1_000).await.unwrap_err().code(),
            UNAUTHORIZED
        );
        let config = server.get_config().await.unwrap();
        assert_eq!(config.fee_percent, 2);
        assert_eq!(config.tiers.len(), 3);

        server.set_fee(key("admin").to_hex(), 10).await.unwrap();
        assert_eq!(server.get_config().await.unwrap().fee_percent, 10);
    }

    #[tokio::test]
    async fn approved_tokens_move_only_for_their_key_holder() {
        let server = test_server("third_party_lock");
        let holder = key("holder");
        let holder_id = holder.account_id().to_b58();
        let stake = (100 * TOKEN).to_string();
        server.approve(holder.to_hex(), (500 * TOKEN).to_string()).await.unwrap();

        // The public id is not a key.
        let err = server.lock(holder_id.clone(), stake.clone(), 3_600).await.unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
        // Any other key acts for its own, unfunded account.
        let err = server.lock(key("mallory").to_hex(), stake.clone(), 3_600).await.unwrap_err();
        assert_eq!(err.code(), TOKEN_TRANSFER_FAILED);
        let err = server.fund_treasury(key("mallory").to_hex(), stake.clone()).await.unwrap_err();
        assert_eq!(err.code(), TOKEN_TRANSFER_FAILED);

        assert_eq!(server.get_user_lock_count(holder_id.clone()).await.unwrap(), 0);
        assert_eq!(server.balance_of(holder_id.clone()).await.unwrap(), (1_000 * TOKEN).to_string());

        assert_eq!(server.lock(holder.to_hex(), stake, 3_600).await.unwrap(), 0);
        assert_eq!(server.balance_of(holder_id.clone()).await.unwrap(), (900 * TOKEN).to_string());
        let err = server.claim(key("mallory").to_hex(), 0).await.unwrap_err();
        assert_eq!(err.code(), LOCK_NOT_FOUND);
        let err = server.claim(holder.to_hex(), 0).await.unwrap_err();
        assert_eq!(err.code(), LOCK_NOT_YET_UNLOCKABLE);
    }

    #[tokio::test]
    async fn simulation_uses_current_tier_and_fee() {
        let server = test_server("simulate");
        let r = server.simulate_payouts((100 * TOKEN).to_string(), 3_600, 200).await.unwrap();
        assert_eq!((r.runs, r.base_guarantee_bps, r.fee_percent), (200, 2_000, 2));
        assert_eq!(r.total_staked, (200 * 100 * TOKEN).to_string());
        let gross: Balance = r.total_gross.parse().unwrap();
        let net: Balance = r.total_net.parse().unwrap();
        let fees: Balance = r.total_fees.parse().unwrap();
        assert_eq!(gross, net + fees);

        let err = server.simulate_payouts("1".into(), 7_200, 10).await.unwrap_err();
        assert_eq!(err.code(), INVALID_DURATION);
        let err = server
            .simulate_payouts("1".into(), 3_600, MAX_SIMULATION_RUNS + 1)
            .await
            .unwrap_err();
        assert_eq!(err.code(), INVALID_PARAMS);
        // Read-only: no lock, no event.
        assert_eq!(server.get_events(0, 10).await.unwrap().len(), 1);
    }
}
