//! The nonce search and validation pipeline.

use crate::cancel::CancelToken;
use crate::error::{PowError, Result};
use primitive_types::U256;
use sha2::{Digest, Sha256};
use shared_types::{BlockSpec, Hash};
use tracing::{debug, trace};

/// Default number of leading zero bits required on a sealing hash.
pub const DEFAULT_DIFFICULTY: u32 = 24;

/// Width of the sealing hash in bits.
const SHA_BITS: u32 = 256;

/// A satisfying `(nonce, hash)` pair found by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seal {
    /// The smallest nonce that satisfies the target.
    pub nonce: u64,
    /// The sealing hash produced by that nonce.
    pub hash: Hash,
}

/// Proof-of-work engine for a fixed difficulty.
///
/// The target is `2^(256 - difficulty)`; a hash is accepted iff its
/// big-endian integer value is strictly below the target.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: u32,
    target: U256,
}

impl ProofOfWork {
    /// Create an engine requiring `difficulty` leading zero bits.
    ///
    /// Difficulty 0 would accept every hash and difficulty 256 none; both
    /// are rejected along with anything else outside `1..=255`.
    pub fn new(difficulty: u32) -> Result<Self> {
        if !(1..=255).contains(&difficulty) {
            return Err(PowError::InvalidDifficulty { difficulty });
        }
        let target = U256::one() << (SHA_BITS - difficulty);
        Ok(Self { difficulty, target })
    }

    /// The configured number of leading zero bits.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// The acceptance threshold, `2^(256 - difficulty)`.
    pub fn target(&self) -> U256 {
        self.target
    }

    /// Canonical pre-image for `spec` at `nonce`.
    ///
    /// Layout: `prev_hash-bytes ∥ data ∥ be64(timestamp) ∥ be64(difficulty)
    /// ∥ be64(nonce)`. Must stay byte-exact between mine time and validate
    /// time.
    fn pre_image(&self, spec: &BlockSpec, nonce: u64) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32 + spec.data.len() + 24);
        if let Some(prev) = &spec.prev_hash {
            bytes.extend_from_slice(prev);
        }
        bytes.extend_from_slice(&spec.data);
        bytes.extend_from_slice(&spec.timestamp.to_be_bytes());
        bytes.extend_from_slice(&u64::from(self.difficulty).to_be_bytes());
        bytes.extend_from_slice(&nonce.to_be_bytes());
        bytes
    }

    /// The sealing hash of `spec` at `nonce`.
    pub fn seal_hash(&self, spec: &BlockSpec, nonce: u64) -> Hash {
        let digest = Sha256::digest(self.pre_image(spec, nonce));
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        hash
    }

    /// Whether `hash`, read big-endian, falls strictly below the target.
    fn meets_target(&self, hash: &Hash) -> bool {
        U256::from_big_endian(hash) < self.target
    }

    /// Search nonces from zero upward until one satisfies the target.
    ///
    /// Deterministic: identical inputs always return the identical seal.
    /// The loop polls `cancel` every iteration and returns
    /// [`PowError::Cancelled`] promptly once the token is raised; the
    /// caller's deadline race is otherwise the only wall-clock bound.
    pub fn mine(&self, spec: &BlockSpec, cancel: &CancelToken) -> Result<Seal> {
        debug!(
            difficulty = self.difficulty,
            data_len = spec.data.len(),
            "starting nonce search"
        );
        for nonce in 0..=u64::MAX {
            if cancel.is_cancelled() {
                debug!(nonce, "nonce search cancelled");
                return Err(PowError::Cancelled);
            }
            let hash = self.seal_hash(spec, nonce);
            if self.meets_target(&hash) {
                trace!(nonce, "satisfying nonce found");
                return Ok(Seal { nonce, hash });
            }
        }
        Err(PowError::NonceSpaceExhausted)
    }

    /// Recompute the sealing hash from the stored fields and check it.
    ///
    /// Pure function, no search. Returns `false` for an unsealed spec, for
    /// a stored hash that does not match the recomputation, and for a hash
    /// that misses the target.
    pub fn validate(&self, spec: &BlockSpec) -> bool {
        let (Some(stored), Some(nonce)) = (spec.hash, spec.nonce) else {
            return false;
        };
        let recomputed = self.seal_hash(spec, nonce);
        recomputed == stored && self.meets_target(&recomputed)
    }
}
