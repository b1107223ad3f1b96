//! Token ledger boundary.
//!
//! The engine never moves balances itself; it asks a [`TokenLedger`] to pull
//! stakes into custody and push payouts out of it. A transfer that already
//! happened can be undone with its receipt when the ledger commit that should
//! follow it fails.

use chest_core::error::ChestError;
use chest_core::types::{AccountId, Balance};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionResult,
    TransactionalTree,
};
use sled::Transactional;

use crate::db::{storage, unwrap_tx, StateDb};

/// Proof of one completed transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Balance,
}

pub trait TokenLedger: Send + Sync {
    /// Account that holds the engine's custody balance.
    fn custody(&self) -> &AccountId;

    /// Move `amount` from `owner` into custody, consuming the allowance
    /// `owner` granted to the engine.
    fn transfer_from(&self, owner: &AccountId, amount: Balance) -> Result<TransferReceipt, ChestError>;

    /// Move `amount` out of custody to `to`.
    fn transfer(&self, to: &AccountId, amount: Balance) -> Result<TransferReceipt, ChestError>;

    /// Undo a transfer previously returned by this ledger.
    fn reverse(&self, receipt: &TransferReceipt) -> Result<(), ChestError>;
}

const BALANCES_TREE: &str = "token_balances";
const ALLOWANCES_TREE: &str = "token_allowances";

type TxResult<T> = ConflictableTransactionResult<T, ChestError>;

fn decode_amount(bytes: &[u8]) -> Result<Balance, ChestError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| ChestError::Serialization(format!("token amount of {} bytes", bytes.len())))?;
    Ok(u128::from_be_bytes(arr))
}

fn read_amount(tree: &sled::Tree, id: &AccountId) -> Result<Balance, ChestError> {
    match tree.get(id.as_bytes()).map_err(storage)? {
        Some(v) => decode_amount(&v),
        None => Ok(0),
    }
}

fn tx_amount(tree: &TransactionalTree, id: &AccountId) -> TxResult<Balance> {
    match tree.get(id.as_bytes())? {
        Some(v) => decode_amount(&v).map_err(ConflictableTransactionError::Abort),
        None => Ok(0),
    }
}

fn tx_set(tree: &TransactionalTree, id: &AccountId, amount: Balance) -> TxResult<()> {
    tree.insert(&id.as_bytes()[..], &amount.to_be_bytes()[..])?;
    Ok(())
}

fn tx_move(balances: &TransactionalTree, from: &AccountId, to: &AccountId, amount: Balance) -> TxResult<()> {
    let have = tx_amount(balances, from)?;
    if have < amount {
        return Err(ConflictableTransactionError::Abort(
            ChestError::AllowanceOrBalanceInsufficient { need: amount, have },
        ));
    }
    if from == to {
        return Ok(());
    }
    let credited = tx_amount(balances, to)?
        .checked_add(amount)
        .ok_or(ConflictableTransactionError::Abort(ChestError::ArithmeticOverflow))?;
    tx_set(balances, from, have - amount)?;
    tx_set(balances, to, credited)
}

/// Balance/allowance ledger kept in two sled trees next to the chest trees,
/// so balances and allowances survive restarts. Used by tests and the dev
/// node; production deployments plug in the real token ledger.
///
///   token_balances   — account bytes → u128 BE
///   token_allowances — owner bytes   → u128 BE (granted to custody)
pub struct SledTokenLedger {
    custody: AccountId,
    balances: sled::Tree,
    allowances: sled::Tree,
}

impl SledTokenLedger {
    pub fn open(db: &StateDb, custody: AccountId) -> Result<Self, ChestError> {
        Ok(Self {
            custody,
            balances: db.open_tree(BALANCES_TREE)?,
            allowances: db.open_tree(ALLOWANCES_TREE)?,
        })
    }

    /// Create `amount` tokens in `to`'s balance.
    pub fn mint(&self, to: &AccountId, amount: Balance) -> Result<(), ChestError> {
        let res: TransactionResult<(), ChestError> = self.balances.transaction(|balances| {
            let credited = tx_amount(balances, to)?
                .checked_add(amount)
                .ok_or(ConflictableTransactionError::Abort(ChestError::ArithmeticOverflow))?;
            tx_set(balances, to, credited)
        });
        unwrap_tx(res)
    }

    /// Set the allowance `owner` grants to the engine.
    pub fn approve(&self, owner: &AccountId, amount: Balance) -> Result<(), ChestError> {
        self.allowances
            .insert(owner.as_bytes(), &amount.to_be_bytes()[..])
            .map_err(storage)?;
        Ok(())
    }

    pub fn balance_of(&self, id: &AccountId) -> Result<Balance, ChestError> {
        read_amount(&self.balances, id)
    }

    pub fn allowance(&self, owner: &AccountId) -> Result<Balance, ChestError> {
        read_amount(&self.allowances, owner)
    }
}

impl TokenLedger for SledTokenLedger {
    fn custody(&self) -> &AccountId {
        &self.custody
    }

    fn transfer_from(&self, owner: &AccountId, amount: Balance) -> Result<TransferReceipt, ChestError> {
        if amount == 0 {
            return Err(ChestError::ZeroAmount);
        }
        let res: TransactionResult<(), ChestError> =
            (&self.balances, &self.allowances).transaction(|(balances, allowances)| {
                let allowed = tx_amount(allowances, owner)?;
                if allowed < amount {
                    return Err(ConflictableTransactionError::Abort(
                        ChestError::AllowanceOrBalanceInsufficient { need: amount, have: allowed },
                    ));
                }
                tx_move(balances, owner, &self.custody, amount)?;
                tx_set(allowances, owner, allowed - amount)
            });
        unwrap_tx(res)?;
        Ok(TransferReceipt { from: owner.clone(), to: self.custody.clone(), amount })
    }

    fn transfer(&self, to: &AccountId, amount: Balance) -> Result<TransferReceipt, ChestError> {
        if amount == 0 {
            return Err(ChestError::ZeroAmount);
        }
        let res: TransactionResult<(), ChestError> = self
            .balances
            .transaction(|balances| tx_move(balances, &self.custody, to, amount));
        unwrap_tx(res)?;
        Ok(TransferReceipt { from: self.custody.clone(), to: to.clone(), amount })
    }

    fn reverse(&self, receipt: &TransferReceipt) -> Result<(), ChestError> {
        let res: TransactionResult<(), ChestError> =
            (&self.balances, &self.allowances).transaction(|(balances, allowances)| {
                tx_move(balances, &receipt.to, &receipt.from, receipt.amount)?;
                if receipt.to == self.custody {
                    // Restore the allowance the pull consumed.
                    let allowed = tx_amount(allowances, &receipt.from)?;
                    tx_set(allowances, &receipt.from, allowed.saturating_add(receipt.amount))?;
                }
                Ok(())
            });
        unwrap_tx(res)
    }
}
