pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod lock;
pub mod totals;
pub mod types;

pub use config::{AdminCredential, ChestConfig, DurationTier};
pub use constants::*;
pub use error::ChestError;
pub use event::ChestEvent;
pub use lock::{ClaimRecord, Lock, LockStatus};
pub use totals::LedgerTotals;
pub use types::*;
