//! Watch-backed local cache of block records.

use parking_lot::RwLock;
use shared_types::{BlockKey, BlockRecord, RecordShape};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::watch;

/// Result of a point-in-time cache lookup.
///
/// The malformed case is an explicit branch rather than a runtime type
/// assertion; workers route it to the backoff path.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The key maps to a well-formed record.
    Found(BlockRecord),
    /// The key is not in the cache (record gone or never seen).
    NotFound,
    /// The key maps to a record that does not decode as a valid block.
    Malformed(String),
}

/// Local mirror of the store's records for one namespace.
///
/// Written only by the informer; read concurrently by workers. Updates
/// replace whole records atomically under the lock.
pub struct WatchCache {
    entries: RwLock<HashMap<BlockKey, BlockRecord>>,
    synced_tx: watch::Sender<bool>,
}

impl WatchCache {
    /// Create an empty, not-yet-synced cache.
    pub fn new() -> Self {
        let (synced_tx, _) = watch::channel(false);
        Self {
            entries: RwLock::new(HashMap::new()),
            synced_tx,
        }
    }

    /// O(1) lookup of the current cached value.
    pub fn get_by_key(&self, key: &BlockKey) -> Lookup {
        match self.entries.read().get(key) {
            None => Lookup::NotFound,
            Some(record) => match record.shape() {
                RecordShape::Complete => Lookup::Found(record.clone()),
                RecordShape::Malformed(reason) => Lookup::Malformed(reason),
            },
        }
    }

    /// Insert or replace a record under its key.
    pub(crate) fn insert(&self, record: BlockRecord) {
        self.entries.write().insert(record.key(), record);
    }

    /// Drop a record.
    pub(crate) fn remove(&self, key: &BlockKey) {
        self.entries.write().remove(key);
    }

    /// Drop every cached record whose key is not in `keys`.
    ///
    /// A fresh listing replaces the cache wholesale: records deleted while
    /// the watch was lagging must not survive the resync.
    pub(crate) fn retain_keys(&self, keys: &HashSet<BlockKey>) {
        self.entries.write().retain(|key, _| keys.contains(key));
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether the initial listing has completed.
    pub fn has_synced(&self) -> bool {
        *self.synced_tx.borrow()
    }

    /// Signal that the initial listing has completed.
    pub(crate) fn mark_synced(&self) {
        // Send only fails with no receivers; the flag itself still updates.
        self.synced_tx.send_replace(true);
    }

    /// Block until the cache is synced, up to `timeout`.
    ///
    /// Returns `false` on timeout; the caller treats that as a fatal
    /// startup condition.
    pub async fn wait_for_sync(&self, timeout: Duration) -> bool {
        let mut rx = self.synced_tx.subscribe();
        if *rx.borrow() {
            return true;
        }
        tokio::time::timeout(timeout, async move {
            while rx.changed().await.is_ok() {
                if *rx.borrow() {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false)
    }
}

impl Default for WatchCache {
    fn default() -> Self {
        Self::new()
    }
}
