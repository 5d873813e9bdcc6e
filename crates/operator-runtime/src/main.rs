//! # HashChain Operator Runtime
//!
//! The main entry point for the operator.
//!
//! ## Startup sequence
//!
//! 1. Initialize logging.
//! 2. Load configuration from environment variables over defaults.
//! 3. Build the in-process block store and create any seed records.
//! 4. Run the reconciler until Ctrl+C, then drain and report the chain.
//!
//! ## Environment
//!
//! - `HC_NAMESPACE`: namespace to reconcile (default `default`)
//! - `HC_WORKERS`: worker pool size (default 3)
//! - `HC_DIFFICULTY`: leading zero bits on sealing hashes (default 24)
//! - `HC_MINING_DEADLINE_SECS`: per-attempt mining bound (default 120)
//! - `HC_SEED_BLOCKS`: comma-separated payloads created at startup

use anyhow::Result;
use hc_01_block_store::{BlockStoreApi, InMemoryBlockStore};
use hc_04_reconciler::{Reconciler, ReconcilerConfig};
use shared_types::BlockRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Runtime configuration assembled from the environment.
struct RuntimeConfig {
    reconciler: ReconcilerConfig,
    seed_blocks: Vec<String>,
}

/// Load configuration from environment variables over defaults.
fn load_config() -> RuntimeConfig {
    let mut reconciler = ReconcilerConfig::default();

    if let Ok(namespace) = std::env::var("HC_NAMESPACE") {
        reconciler.namespace = namespace;
    }
    if let Ok(workers) = std::env::var("HC_WORKERS") {
        match workers.parse() {
            Ok(w) => reconciler.workers = w,
            Err(_) => warn!("HC_WORKERS must be a positive integer; keeping default"),
        }
    }
    if let Ok(difficulty) = std::env::var("HC_DIFFICULTY") {
        match difficulty.parse() {
            Ok(d) => reconciler.difficulty = d,
            Err(_) => warn!("HC_DIFFICULTY must be an integer in 1..=255; keeping default"),
        }
    }
    if let Ok(secs) = std::env::var("HC_MINING_DEADLINE_SECS") {
        match secs.parse() {
            Ok(s) => reconciler.mining_deadline = Duration::from_secs(s),
            Err(_) => warn!("HC_MINING_DEADLINE_SECS must be an integer; keeping default"),
        }
    }

    let seed_blocks = std::env::var("HC_SEED_BLOCKS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    RuntimeConfig {
        reconciler,
        seed_blocks,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config();
    let store = Arc::new(InMemoryBlockStore::new());

    for (index, payload) in config.seed_blocks.iter().enumerate() {
        let record = BlockRecord::new(
            config.reconciler.namespace.clone(),
            format!("seed-{index}"),
            payload.clone().into_bytes(),
        );
        store.create(record).await?;
    }
    if !config.seed_blocks.is_empty() {
        info!(count = config.seed_blocks.len(), "seed records created");
    }

    let reconciler = Reconciler::new(store, config.reconciler)?;
    let chain = reconciler.chain();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut controller = tokio::spawn(reconciler.run(shutdown_rx));

    info!("operator running; press Ctrl+C to stop");
    tokio::select! {
        result = &mut controller => {
            // The controller only exits on its own for fatal startup errors.
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            shutdown_tx.send(true)?;
            controller.await??;
        }
    }

    let chain = chain.lock();
    info!(
        height = chain.len(),
        linked = chain.verify_linkage(),
        "final chain state"
    );
    Ok(())
}
