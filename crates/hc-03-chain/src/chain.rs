//! The chain container and its append discipline.

use crate::error::{ChainError, Result};
use hc_02_proof_of_work::ProofOfWork;
use shared_types::{unix_timestamp, BlockKey, BlockRecord, BlockSpec, Hash, ObjectMeta};
use tracing::{debug, info};

/// Payload carried by a synthesized genesis block.
pub const GENESIS_PAYLOAD: &[u8] = b"genesis";

/// An ordered append-only sequence of sealed block records.
///
/// Created empty; mutated only by successful reconciliation; never trimmed.
#[derive(Debug, Default)]
pub struct Chain {
    blocks: Vec<BlockRecord>,
    /// Whether `blocks[0]` was synthesized by `add_genesis_if_empty` rather
    /// than reconciled from a store record.
    synthetic_genesis: bool,
}

impl Chain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chained blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block has been chained yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The current tail of the chain.
    pub fn tip(&self) -> Option<&BlockRecord> {
        self.blocks.last()
    }

    /// Hash of the current tail, if any.
    pub fn tip_hash(&self) -> Option<Hash> {
        self.blocks.last().and_then(|b| b.spec.hash)
    }

    /// The chained records in chain order.
    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    /// Whether a block with this sealing hash is already chained.
    pub fn contains_hash(&self, hash: &Hash) -> bool {
        self.blocks.iter().any(|b| b.spec.hash == Some(*hash))
    }

    /// Whether a record with this key is already chained.
    ///
    /// Full resyncs re-deliver add events for already-reconciled records;
    /// this check is what makes the replay a no-op. A synthesized genesis
    /// block is skipped: it is not a store record, so its key must never
    /// shadow one a user happens to name `genesis`.
    pub fn contains_key(&self, key: &BlockKey) -> bool {
        let skip = usize::from(self.synthetic_genesis);
        self.blocks.iter().skip(skip).any(|b| &b.key() == key)
    }

    /// Seed a genesis block if the chain is empty; no-op otherwise.
    ///
    /// The genesis block has no predecessor and its hash is the sealing
    /// hash at nonce 0, computed with the engine's encoding so later
    /// appends link against a well-defined tip. It is not difficulty
    /// checked: nothing validates the genesis seal, it only anchors
    /// linkage.
    pub fn add_genesis_if_empty(&mut self, namespace: &str, pow: &ProofOfWork) {
        if !self.blocks.is_empty() {
            return;
        }
        let mut spec = BlockSpec {
            timestamp: unix_timestamp(),
            data: GENESIS_PAYLOAD.to_vec(),
            prev_hash: None,
            hash: None,
            nonce: None,
        };
        let hash = pow.seal_hash(&spec, 0);
        spec.hash = Some(hash);
        spec.nonce = Some(0);
        self.blocks.push(BlockRecord {
            meta: ObjectMeta {
                namespace: namespace.to_string(),
                name: "genesis".to_string(),
                revision: 0,
            },
            spec,
        });
        self.synthetic_genesis = true;
        info!(hash = %short_hash(&hash), "seeded genesis block");
    }

    /// Append a sealed record to the chain.
    ///
    /// If the chain is non-empty and the record's `prev_hash` does not match
    /// the current tip, it is rewritten to the tip hash immediately before
    /// insertion: mining starts against a tip that other workers may have
    /// advanced in the meantime, and linkage is decided at append time.
    pub fn append(&mut self, mut record: BlockRecord) -> Result<()> {
        if record.spec.hash.is_none() {
            return Err(ChainError::NotSealed { key: record.key() });
        }
        match self.tip_hash() {
            None => record.spec.prev_hash = None,
            Some(tip_hash) => {
                if record.spec.prev_hash != Some(tip_hash) {
                    debug!(
                        key = %record.key(),
                        tip = %short_hash(&tip_hash),
                        "healing stale prev_hash at append time"
                    );
                    record.spec.prev_hash = Some(tip_hash);
                }
            }
        }
        self.blocks.push(record);
        Ok(())
    }

    /// Check the full linkage invariant.
    pub fn verify_linkage(&self) -> bool {
        if let Some(first) = self.blocks.first() {
            if first.spec.prev_hash.is_some() {
                return false;
            }
        }
        self.blocks
            .windows(2)
            .all(|pair| pair[1].spec.prev_hash == pair[0].spec.hash)
    }
}

/// First four bytes of a hash, hex encoded, for log lines.
fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
