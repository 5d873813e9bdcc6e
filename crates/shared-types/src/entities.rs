//! # Core Domain Entities
//!
//! Defines the block record as it exists in the external resource store,
//! with explicit named metadata fields instead of structural embedding.

use crate::errors::EntityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Seconds since the Unix epoch, as an `i64`.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Metadata identifying a record inside the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Scope the record lives in.
    pub namespace: String,
    /// Name, unique within the namespace.
    pub name: String,
    /// Revision assigned by the store; increases on every write.
    pub revision: u64,
}

/// The stable `namespace/name` identifier for a block record.
///
/// Used for watch-cache lookup and work-queue deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockKey {
    /// Scope component of the key.
    pub namespace: String,
    /// Name component of the key.
    pub name: String,
}

impl BlockKey {
    /// Build a key from its components.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The payload fields of a block record.
///
/// A spec is *unsealed* while `hash` and `nonce` are both `None`, and
/// *sealed* once both are set. Sealing is monotonic: once sealed the fields
/// never change again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Seconds since epoch at record creation.
    pub timestamp: i64,
    /// Opaque byte payload.
    pub data: Vec<u8>,
    /// Hash of the chain predecessor; `None` for a genesis predecessor.
    pub prev_hash: Option<Hash>,
    /// Sealing hash; `None` until sealed.
    pub hash: Option<Hash>,
    /// Proof-of-work nonce; `None` until sealed.
    pub nonce: Option<u64>,
}

impl BlockSpec {
    /// Create an unsealed spec carrying `data`, stamped with the current time.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            timestamp: unix_timestamp(),
            data,
            prev_hash: None,
            hash: None,
            nonce: None,
        }
    }

    /// Whether both seal fields are present.
    pub fn is_sealed(&self) -> bool {
        self.hash.is_some() && self.nonce.is_some()
    }

    /// Attach a `(nonce, hash)` pair found by the proof-of-work search.
    ///
    /// Fails on an already-sealed spec; sealing never overwrites.
    pub fn seal(&mut self, nonce: u64, hash: Hash) -> Result<(), EntityError> {
        if self.hash.is_some() || self.nonce.is_some() {
            return Err(EntityError::AlreadySealed);
        }
        self.hash = Some(hash);
        self.nonce = Some(nonce);
        Ok(())
    }
}

/// Shape classification of a cached record.
///
/// The malformed case replaces runtime type assertions with an explicit,
/// testable branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordShape {
    /// The record decodes as a valid block.
    Complete,
    /// The record is not a valid block; the reason is operator-facing.
    Malformed(String),
}

/// A block record as held in the external store: explicit metadata plus the
/// block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Store metadata (namespace, name, revision).
    pub meta: ObjectMeta,
    /// Block payload fields.
    pub spec: BlockSpec,
}

impl BlockRecord {
    /// Create an unsealed record in `namespace` under `name`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            meta: ObjectMeta {
                namespace: namespace.into(),
                name: name.into(),
                revision: 0,
            },
            spec: BlockSpec::new(data),
        }
    }

    /// The record's `namespace/name` key.
    pub fn key(&self) -> BlockKey {
        BlockKey::new(self.meta.namespace.clone(), self.meta.name.clone())
    }

    /// Whether the payload carries a full seal.
    pub fn is_sealed(&self) -> bool {
        self.spec.is_sealed()
    }

    /// Classify the record's shape.
    ///
    /// A record with exactly one of `hash`/`nonce` set carries a partial
    /// seal and cannot be validated or mined; a non-positive timestamp can
    /// never re-validate under the fixed-width encoding contract.
    pub fn shape(&self) -> RecordShape {
        if self.spec.hash.is_some() != self.spec.nonce.is_some() {
            return RecordShape::Malformed("partial seal: hash and nonce must be set together".into());
        }
        if self.spec.timestamp <= 0 {
            return RecordShape::Malformed(format!(
                "non-positive timestamp {}",
                self.spec.timestamp
            ));
        }
        RecordShape::Complete
    }
}
