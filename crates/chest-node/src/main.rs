//! chest-node: the chest ledger node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the ledger database
//!   2. Apply genesis if the DB is fresh
//!   3. Open the bundled token ledger; fund it only when genesis ran
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run until Ctrl-C, then flush

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use chest_core::constants::UNITS_PER_TOKEN;
use chest_core::types::AccountId;
use chest_rpc::{system_clock, RpcServer, RpcServerState};
use chest_state::{
    apply_genesis, fund_dev_ledger, ChestEngine, DeterministicSeedSource, DevBalance,
    EntropySeedSource, GenesisParams, SeedSource, SledTokenLedger, StateDb, TokenLedger,
};

/// Label of the dev custody account; its id is BLAKE3 of this label.
const CUSTODY_LABEL: &str = "chest-custody";

#[derive(Parser, Debug)]
#[command(
    name = "chest-node",
    version,
    about = "Chest node: time-locked stakes with a guaranteed floor and a seeded risk multiplier"
)]
struct Args {
    /// Directory for the persistent ledger database.
    #[arg(long, default_value = "~/.chest/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON. Applied on first run only, together with
    /// its dev balances in the bundled token ledger.
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Hex-encoded 32-byte base for reproducible lock seeds. Testing only.
    #[arg(long)]
    seed_base: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,chest=debug")),
        )
        .init();

    let args = Args::parse();
    info!("chest node starting");

    // ── Ledger database ───────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening ledger database")?);

    // ── Token ledger ──────────────────────────────────────────────────────────
    // Balances and allowances persist in the ledger database next to the
    // chest trees.
    let tokens = Arc::new(
        SledTokenLedger::open(&db, AccountId::from_label(CUSTODY_LABEL))
            .context("opening token ledger")?,
    );

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    if !db.is_initialized() {
        info!("fresh database, applying genesis");
        let params = load_or_default_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&db, &params).context("applying genesis")?;
        fund_dev_ledger(&tokens, &params).context("funding dev token ledger")?;
    } else {
        info!("existing database found, skipping genesis");
    }
    let totals = db.get_totals()?.context("ledger totals missing after genesis")?;
    info!(
        custody = %tokens.custody(),
        custody_balance = tokens.balance_of(tokens.custody())?,
        treasury = totals.treasury_balance,
        "token ledger loaded"
    );

    // ── Engine ────────────────────────────────────────────────────────────────
    let seeds: Box<dyn SeedSource> = match &args.seed_base {
        Some(h) => {
            let mut base = [0u8; 32];
            hex::decode_to_slice(h, &mut base).context("parsing --seed-base")?;
            warn!("deterministic lock seeds enabled. DO NOT USE IN PRODUCTION");
            Box::new(DeterministicSeedSource::new(base))
        }
        None => Box::new(EntropySeedSource),
    };
    let engine = Arc::new(ChestEngine::new(Arc::clone(&db), tokens.clone(), seeds));

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        engine,
        tokens: Some(tokens),
        clock: system_clock(),
    });
    let rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!("node ready");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;

    info!("shutting down");
    let _ = rpc_handle.stop();
    rpc_handle.stopped().await;
    db.flush().context("flushing ledger database")?;
    Ok(())
}

/// Load genesis parameters from a JSON file, or build a dev configuration
/// if no path is given.
///
/// The dev configuration uses label-derived accounts ("admin", "alice",
/// "bob"), a 100,000-token treasury and 10,000 tokens per user. Each dev
/// account key is BLAKE3 of its label.
fn load_or_default_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading genesis params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing genesis params JSON");
    }
    warn!("No --genesis-params provided. Using dev accounts with label-derived keys. DO NOT USE IN PRODUCTION.");
    let mut params = GenesisParams::new(AccountId::from_label("admin"), 100_000 * UNITS_PER_TOKEN);
    params.dev_balances = ["alice", "bob"]
        .iter()
        .map(|label| DevBalance {
            account: AccountId::from_label(label).to_b58(),
            amount: 10_000 * UNITS_PER_TOKEN,
        })
        .collect();
    Ok(params)
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
