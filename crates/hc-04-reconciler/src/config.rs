//! Configuration for the reconciler.

use hc_02_proof_of_work::DEFAULT_DIFFICULTY;
use std::time::Duration;

/// Default number of workers draining the queue.
pub const DEFAULT_WORKERS: usize = 3;

/// Default wall-clock bound on a single mining attempt.
pub const DEFAULT_MINING_DEADLINE: Duration = Duration::from_secs(120);

/// Default bound on waiting for the initial cache sync.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration for the reconciliation engine.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Namespace whose block records are reconciled.
    pub namespace: String,

    /// Worker pool size; distinct keys reconcile fully in parallel.
    pub workers: usize,

    /// Leading zero bits required on a sealing hash.
    pub difficulty: u32,

    /// Deadline raced against each mining attempt; on expiry the record is
    /// purged from the store.
    pub mining_deadline: Duration,

    /// How long startup may wait for the cache's initial listing.
    pub sync_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            workers: DEFAULT_WORKERS,
            difficulty: DEFAULT_DIFFICULTY,
            mining_deadline: DEFAULT_MINING_DEADLINE,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}
