//! chest-state
//!
//! Persistent lock ledger and the engine that mutates it.
//!
//!   db       — sled trees and the atomic multi-tree commit
//!   engine   — lock, claim, treasury funding, administration, reads
//!   treasury — admission check and health buckets
//!   token    — token ledger boundary and a sled-backed dev implementation
//!   seed     — per-lock seed sources
//!   genesis  — initial configuration and treasury

pub mod db;
pub mod engine;
pub mod genesis;
pub mod seed;
pub mod token;
pub mod treasury;

pub use db::{StagedMutations, StateDb};
pub use engine::{ChestEngine, ClaimOutcome, MAX_EVENT_PAGE};
pub use genesis::{apply_genesis, fund_dev_ledger, DevBalance, GenesisParams};
pub use seed::{DeterministicSeedSource, EntropySeedSource, SeedContext, SeedSource};
pub use token::{SledTokenLedger, TokenLedger, TransferReceipt};
pub use treasury::{assess_health, check_admission, HealthStatus, TreasuryHealth};
