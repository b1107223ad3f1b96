//! Ledger genesis.
//!
//! Writes the initial configuration and totals into an empty `StateDb`
//! without going through the engine. The initial treasury funding is
//! recorded as the first `TreasuryFunded` event.
//!
//! The bundled token ledger is funded once, right after genesis, by
//! [`fund_dev_ledger`]. Its trees persist, so later starts leave it alone.

use chest_core::config::{ChestConfig, DurationTier};
use chest_core::error::ChestError;
use chest_core::event::ChestEvent;
use chest_core::totals::LedgerTotals;
use chest_core::types::{AccountId, Balance};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{StagedMutations, StateDb};
use crate::token::{SledTokenLedger, TokenLedger};

/// Starting balance of a development account in the bundled token ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevBalance {
    /// Base-58 account id.
    pub account: String,
    pub amount: Balance,
}

/// Genesis parameters, usually loaded from a JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    /// Base-58 id of the administrator.
    pub admin: String,
    /// Tokens placed in the treasury before the first lock.
    pub treasury_funding: Balance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stake: Option<Balance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_percent: Option<u8>,
    /// Replaces the default 1h/6h/24h table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<DurationTier>>,
    #[serde(default)]
    pub dev_balances: Vec<DevBalance>,
}

impl GenesisParams {
    pub fn new(admin: AccountId, treasury_funding: Balance) -> Self {
        Self {
            admin: admin.to_b58(),
            treasury_funding,
            min_stake: None,
            fee_percent: None,
            tiers: None,
            dev_balances: Vec::new(),
        }
    }

    pub fn admin_id(&self) -> Result<AccountId, ChestError> {
        parse_account(&self.admin)
    }

    /// Dev balances with their ids decoded.
    pub fn dev_accounts(&self) -> Result<Vec<(AccountId, Balance)>, ChestError> {
        self.dev_balances
            .iter()
            .map(|d| Ok((parse_account(&d.account)?, d.amount)))
            .collect()
    }

    /// Configuration described by these parameters.
    pub fn build_config(&self) -> Result<ChestConfig, ChestError> {
        let mut config = ChestConfig::with_defaults(self.admin_id()?);
        if let Some(min) = self.min_stake {
            config.min_stake = min;
        }
        if let Some(fee) = self.fee_percent {
            ChestConfig::validate_fee(fee)?;
            config.fee_percent = fee;
        }
        if let Some(tiers) = &self.tiers {
            config.tiers.clear();
            for t in tiers {
                config.upsert_tier(t.duration, t.base_guarantee_bps)?;
            }
        }
        Ok(config)
    }
}

fn parse_account(s: &str) -> Result<AccountId, ChestError> {
    AccountId::from_b58(s).map_err(|e| ChestError::Serialization(format!("account id {s}: {e}")))
}

/// Apply genesis to an empty database. Fails if the ledger already has a
/// configuration.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<ChestConfig, ChestError> {
    if db.is_initialized() {
        return Err(ChestError::Storage("ledger already initialized".into()));
    }
    let config = params.build_config()?;

    let mut totals = LedgerTotals::default();
    let mut staged = StagedMutations::default();
    if params.treasury_funding > 0 {
        totals.record_funding(params.treasury_funding)?;
        let seq = totals.next_event_seq();
        staged.events.push((seq, ChestEvent::TreasuryFunded {
            funder: config.admin.clone(),
            amount: params.treasury_funding,
        }));
    }
    staged.totals = Some(totals);
    staged.config = Some(config.clone());
    db.commit(&staged)?;

    info!(
        admin = %config.admin,
        treasury = params.treasury_funding,
        min_stake = config.min_stake,
        fee_percent = config.fee_percent,
        tiers = config.tiers.len(),
        "genesis applied"
    );
    Ok(config)
}

/// Mint the genesis treasury into custody and each dev balance into its
/// account. Call once, in the same start that applied genesis.
pub fn fund_dev_ledger(ledger: &SledTokenLedger, params: &GenesisParams) -> Result<(), ChestError> {
    let accounts = params.dev_accounts()?;
    if params.treasury_funding > 0 {
        ledger.mint(ledger.custody(), params.treasury_funding)?;
    }
    for (account, amount) in &accounts {
        ledger.mint(account, *amount)?;
    }
    info!(
        custody = %ledger.custody(),
        treasury = params.treasury_funding,
        dev_accounts = accounts.len(),
        "dev token ledger funded"
    );
    Ok(())
}
