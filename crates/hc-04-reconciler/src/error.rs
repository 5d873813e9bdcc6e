//! Error types for the reconciliation engine.

use hc_01_block_store::StoreError;
use hc_02_proof_of_work::PowError;
use hc_03_chain::ChainError;
use shared_types::{BlockKey, EntityError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors raised while reconciling a key or running the engine.
///
/// Per-key errors are recovered locally by the worker loop (re-queue with
/// backoff); only startup conditions escalate to the process.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The cache never reported synced; fatal startup condition.
    #[error("cache did not sync within {0:?}")]
    SyncTimeout(Duration),

    /// Worker pool size of zero cannot drain the queue.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cached record does not decode as a valid block.
    #[error("record {key} is malformed: {reason}")]
    Malformed {
        /// Key of the malformed record.
        key: BlockKey,
        /// Operator-facing description of the defect.
        reason: String,
    },

    /// A record arrived sealed but its seal does not validate.
    #[error("record {key} carries an invalid seal")]
    InvalidSeal {
        /// Key of the offending record.
        key: BlockKey,
    },

    /// The mining deadline elapsed; the record was purged.
    #[error("mining deadline elapsed for {key}; record purged")]
    MiningTimeout {
        /// Key whose mining attempt timed out.
        key: BlockKey,
    },

    /// The background mining task aborted without a result.
    #[error("mining task for {key} aborted")]
    MiningTaskFailed {
        /// Key whose mining task died.
        key: BlockKey,
    },

    /// Proof-of-work engine error.
    #[error(transparent)]
    Pow(#[from] PowError),

    /// Chain append error.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Entity-level error (sealing).
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Store access error.
    #[error(transparent)]
    Store(#[from] StoreError),
}
