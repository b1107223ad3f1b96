use chest_core::config::ChestConfig;
use chest_core::error::ChestError;
use chest_core::event::ChestEvent;
use chest_core::lock::Lock;
use chest_core::totals::LedgerTotals;
use chest_core::types::{AccountId, LockIndex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::Transactional;
use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

const META_CONFIG: &str = "config";
const META_TOTALS: &str = "totals";

/// Every write of one engine operation, committed together by
/// [`StateDb::commit`].
#[derive(Default, Debug)]
pub struct StagedMutations {
    pub locks: Vec<Lock>,
    pub lock_counts: Vec<(AccountId, u64)>,
    pub events: Vec<(u64, ChestEvent)>,
    pub totals: Option<LedgerTotals>,
    pub config: Option<ChestConfig>,
}

/// Persistent ledger database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   locks        — owner bytes ‖ index BE → bincode(Lock)
///   lock_counts  — owner bytes            → u64 BE
///   events       — seq BE                 → bincode(ChestEvent)
///   meta         — utf8 key bytes         → bincode(ChestConfig | LedgerTotals)
///
/// The bundled token ledger keeps its own trees in the same database; see
/// [`crate::token::SledTokenLedger`].
pub struct StateDb {
    db: sled::Db,
    locks: sled::Tree,
    lock_counts: sled::Tree,
    events: sled::Tree,
    meta: sled::Tree,
    #[cfg(test)]
    fail_next_commit: AtomicBool,
}

fn lock_key(owner: &AccountId, index: LockIndex) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..32].copy_from_slice(owner.as_bytes());
    key[32..].copy_from_slice(&index.to_be_bytes());
    key
}

fn decode_u64(bytes: &[u8]) -> u64 {
    let mut arr = [0u8; 8];
    let n = bytes.len().min(8);
    arr[8 - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    u64::from_be_bytes(arr)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ChestError> {
    bincode::serialize(value).map_err(|e| ChestError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ChestError> {
    bincode::deserialize(bytes).map_err(|e| ChestError::Serialization(e.to_string()))
}

pub(crate) fn storage(e: sled::Error) -> ChestError {
    ChestError::Storage(e.to_string())
}

pub(crate) fn unwrap_tx<T>(res: TransactionResult<T, ChestError>) -> Result<T, ChestError> {
    res.map_err(|e| match e {
        TransactionError::Abort(inner) => inner,
        TransactionError::Storage(e) => storage(e),
    })
}

impl StateDb {
    /// Open or create the ledger database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ChestError> {
        let db = sled::open(path).map_err(storage)?;
        let locks       = db.open_tree("locks").map_err(storage)?;
        let lock_counts = db.open_tree("lock_counts").map_err(storage)?;
        let events      = db.open_tree("events").map_err(storage)?;
        let meta        = db.open_tree("meta").map_err(storage)?;
        Ok(Self {
            db,
            locks,
            lock_counts,
            events,
            meta,
            #[cfg(test)]
            fail_next_commit: AtomicBool::new(false),
        })
    }

    /// Open an extra named tree in the same database.
    pub fn open_tree(&self, name: &str) -> Result<sled::Tree, ChestError> {
        self.db.open_tree(name).map_err(storage)
    }

    /// Make the next [`StateDb::commit`] fail with a storage error.
    #[cfg(test)]
    pub(crate) fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    // ── Meta ──────────────────────────────────────────────────────────────────

    pub fn get_config(&self) -> Result<Option<ChestConfig>, ChestError> {
        match self.meta.get(META_CONFIG.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_totals(&self) -> Result<Option<LedgerTotals>, ChestError> {
        match self.meta.get(META_TOTALS.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.meta.contains_key(META_CONFIG.as_bytes()).unwrap_or(false)
    }

    // ── Locks ─────────────────────────────────────────────────────────────────

    pub fn get_lock(&self, owner: &AccountId, index: LockIndex) -> Result<Option<Lock>, ChestError> {
        match self.locks.get(lock_key(owner, index)).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn lock_count(&self, owner: &AccountId) -> Result<u64, ChestError> {
        Ok(self
            .lock_counts
            .get(owner.as_bytes())
            .map_err(storage)?
            .map(|v| decode_u64(&v))
            .unwrap_or(0))
    }

    /// All locks of `owner` in creation order, read as one snapshot.
    pub fn get_locks(&self, owner: &AccountId) -> Result<Vec<Lock>, ChestError> {
        let res: TransactionResult<Vec<Lock>, ChestError> =
            (&self.locks, &self.lock_counts).transaction(|(locks, counts)| {
                let count = counts.get(owner.as_bytes())?.map(|v| decode_u64(&v)).unwrap_or(0);
                let mut out = Vec::with_capacity(count as usize);
                for index in 0..count {
                    if let Some(bytes) = locks.get(lock_key(owner, index))? {
                        out.push(decode(&bytes).map_err(ConflictableTransactionError::Abort)?);
                    }
                }
                Ok(out)
            });
        unwrap_tx(res)
    }

    // ── Events ────────────────────────────────────────────────────────────────

    /// Up to `limit` events starting at sequence number `from_seq`.
    pub fn get_events(&self, from_seq: u64, limit: usize) -> Result<Vec<(u64, ChestEvent)>, ChestError> {
        let mut out = Vec::new();
        for item in self.events.range(from_seq.to_be_bytes()..).take(limit) {
            let (key, bytes) = item.map_err(storage)?;
            out.push((decode_u64(&key), decode(&bytes)?));
        }
        Ok(out)
    }

    // ── Commit ────────────────────────────────────────────────────────────────

    /// Apply `staged` atomically across all trees.
    pub fn commit(&self, staged: &StagedMutations) -> Result<(), ChestError> {
        #[cfg(test)]
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(ChestError::Storage("injected commit failure".into()));
        }

        // Encode outside the transaction closure; sled may re-run it.
        let lock_rows = staged
            .locks
            .iter()
            .map(|l| Ok((lock_key(&l.owner, l.index), encode(l)?)))
            .collect::<Result<Vec<_>, ChestError>>()?;
        let event_rows = staged
            .events
            .iter()
            .map(|(seq, ev)| Ok((seq.to_be_bytes(), encode(ev)?)))
            .collect::<Result<Vec<_>, ChestError>>()?;
        let totals_row = staged.totals.as_ref().map(encode).transpose()?;
        let config_row = staged.config.as_ref().map(encode).transpose()?;

        let res: TransactionResult<(), ChestError> = (
            &self.locks,
            &self.lock_counts,
            &self.events,
            &self.meta,
        )
            .transaction(|(locks, counts, events, meta)| {
                for (key, value) in &lock_rows {
                    locks.insert(&key[..], value.as_slice())?;
                }
                for (owner, count) in &staged.lock_counts {
                    counts.insert(&owner.as_bytes()[..], &count.to_be_bytes()[..])?;
                }
                for (key, value) in &event_rows {
                    events.insert(&key[..], value.as_slice())?;
                }
                if let Some(value) = &totals_row {
                    meta.insert(META_TOTALS.as_bytes(), value.as_slice())?;
                }
                if let Some(value) = &config_row {
                    meta.insert(META_CONFIG.as_bytes(), value.as_slice())?;
                }
                Ok(())
            });
        unwrap_tx(res)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), ChestError> {
        self.db.flush().map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chest_core::types::{LockDuration, RandomSeed};

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("chest_db_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn lock(owner: &AccountId, index: u64) -> Lock {
        Lock {
            owner: owner.clone(),
            index,
            amount: 100,
            duration: LockDuration(3_600),
            lock_time: 0,
            random_seed: RandomSeed([index as u8; 32]),
            base_guarantee_bps: 2_000,
            claimed: false,
            claim: None,
        }
    }

    #[test]
    fn commit_and_read_back() {
        let db = temp_db("commit_read");
        let alice = AccountId::from_label("alice");
        let staged = StagedMutations {
            locks: vec![lock(&alice, 0), lock(&alice, 1)],
            lock_counts: vec![(alice.clone(), 2)],
            events: vec![],
            totals: Some(LedgerTotals { total_locked: 200, ..Default::default() }),
            config: Some(ChestConfig::with_defaults(alice.clone())),
        };
        db.commit(&staged).unwrap();

        assert_eq!(db.lock_count(&alice).unwrap(), 2);
        let locks = db.get_locks(&alice).unwrap();
        assert_eq!(locks.len(), 2);
        assert_eq!(locks[1].index, 1);
        assert_eq!(db.get_totals().unwrap().unwrap().total_locked, 200);
        assert!(db.is_initialized());
    }

    #[test]
    fn unknown_owner_has_no_locks() {
        let db = temp_db("unknown_owner");
        let bob = AccountId::from_label("bob");
        assert_eq!(db.lock_count(&bob).unwrap(), 0);
        assert!(db.get_locks(&bob).unwrap().is_empty());
        assert!(db.get_lock(&bob, 0).unwrap().is_none());
        assert!(!db.is_initialized());
    }

    #[test]
    fn events_read_in_sequence_order() {
        let db = temp_db("events_order");
        let funder = AccountId::from_label("funder");
        let events = (0..5u64)
            .map(|seq| (seq, ChestEvent::TreasuryFunded { funder: funder.clone(), amount: seq as u128 }))
            .collect();
        db.commit(&StagedMutations { events, ..Default::default() }).unwrap();

        let page = db.get_events(2, 2).unwrap();
        assert_eq!(page.iter().map(|(s, _)| *s).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(db.get_events(0, 100).unwrap().len(), 5);
    }
}
