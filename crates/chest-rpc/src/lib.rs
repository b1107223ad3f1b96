//! chest-rpc
//!
//! JSON-RPC 2.0 server for the chest ledger.
//!
//! Namespace: "chest"
//! Methods:
//!   chest_lock / chest_claim          — create and claim locks
//!   chest_getUserLocks                — all locks of an account
//!   chest_getUserLockCount            — number of locks of an account
//!   chest_previewPayout               — guaranteed amount and payout range
//!   chest_calculatePayout             — gross payout of a lock
//!   chest_fundTreasury                — add tokens to the treasury
//!   chest_getTreasuryBalance / chest_getTotals / chest_getHealth
//!   chest_getEvents                   — audit trail
//!   chest_simulatePayouts             — average payout over synthetic seeds
//!   chest_getConfig / chest_setMinStake / chest_setFee / chest_setTier
//!   chest_approve / chest_balanceOf   — bundled dev token ledger
//!
//! Token-moving and admin methods authenticate with the caller's account key.

pub mod api;
pub mod server;
pub mod types;

pub use server::{system_clock, Clock, RpcServer, RpcServerState};
pub use types::{
    RpcClaimRecord, RpcClaimResult, RpcConfig, RpcEvent, RpcHealth, RpcLock, RpcPayoutPreview,
    RpcSimulation, RpcTier, RpcTotals,
};
