use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{
    RpcClaimResult, RpcConfig, RpcEvent, RpcHealth, RpcLock, RpcPayoutPreview, RpcSimulation,
    RpcTotals,
};

/// Chest JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "chest_" via `namespace = "chest"`.
/// Accounts are base-58 strings; amounts are decimal strings of base units.
///
/// Methods that move tokens or change configuration take the caller's
/// hex-encoded 32-byte account key instead of an account id. The acting
/// account is derived from the key, so a published id cannot be replayed.
#[rpc(server, namespace = "chest")]
pub trait ChestApi {
    // ── Locks ─────────────────────────────────────────────────────────────────

    /// Lock `amount` of the key holder's approved tokens for `duration_secs`.
    /// Returns the new lock index.
    #[method(name = "lock")]
    async fn lock(&self, key: String, amount: String, duration_secs: u64) -> RpcResult<u64>;

    /// Claim an unlockable lock owned by the key holder.
    #[method(name = "claim")]
    async fn claim(&self, key: String, index: u64) -> RpcResult<RpcClaimResult>;

    /// All locks of `owner`, in creation order.
    #[method(name = "getUserLocks")]
    async fn get_user_locks(&self, owner: String) -> RpcResult<Vec<RpcLock>>;

    #[method(name = "getUserLockCount")]
    async fn get_user_lock_count(&self, owner: String) -> RpcResult<u64>;

    /// Guaranteed amount and min/max gross payout of a lock.
    #[method(name = "previewPayout")]
    async fn preview_payout(&self, owner: String, index: u64) -> RpcResult<RpcPayoutPreview>;

    /// Gross payout a claim realizes (or realized) for a lock.
    #[method(name = "calculatePayout")]
    async fn calculate_payout(&self, owner: String, index: u64) -> RpcResult<String>;

    // ── Treasury ──────────────────────────────────────────────────────────────

    #[method(name = "fundTreasury")]
    async fn fund_treasury(&self, key: String, amount: String) -> RpcResult<()>;

    #[method(name = "getTreasuryBalance")]
    async fn get_treasury_balance(&self) -> RpcResult<String>;

    #[method(name = "getTotals")]
    async fn get_totals(&self) -> RpcResult<RpcTotals>;

    #[method(name = "getHealth")]
    async fn get_health(&self) -> RpcResult<RpcHealth>;

    /// Audit trail page starting at `from_seq`.
    #[method(name = "getEvents")]
    async fn get_events(&self, from_seq: u64, limit: u32) -> RpcResult<Vec<RpcEvent>>;

    /// Average payout of `runs` synthetic claims of `amount` on the current
    /// tier for `duration_secs` and the current fee. Read-only.
    #[method(name = "simulatePayouts")]
    async fn simulate_payouts(&self, amount: String, duration_secs: u64, runs: u64) -> RpcResult<RpcSimulation>;

    // ── Administration ────────────────────────────────────────────────────────

    #[method(name = "getConfig")]
    async fn get_config(&self) -> RpcResult<RpcConfig>;

    #[method(name = "setMinStake")]
    async fn set_min_stake(&self, admin_key: String, amount: String) -> RpcResult<()>;

    #[method(name = "setFee")]
    async fn set_fee(&self, admin_key: String, percent: u8) -> RpcResult<()>;

    #[method(name = "setTier")]
    async fn set_tier(&self, admin_key: String, duration_secs: u64, base_guarantee_bps: u32) -> RpcResult<()>;

    // ── Dev token ledger ──────────────────────────────────────────────────────

    /// Set the allowance the key holder grants the chest. Dev ledger only.
    #[method(name = "approve")]
    async fn approve(&self, key: String, amount: String) -> RpcResult<()>;

    /// Token balance of `account`. Dev ledger only.
    #[method(name = "balanceOf")]
    async fn balance_of(&self, account: String) -> RpcResult<String>;
}
